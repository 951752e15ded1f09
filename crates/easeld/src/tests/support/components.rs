//! Recording components for lifecycle and protocol tests.

use std::sync::{Arc, Mutex};

use easel_protocol::{MessageType, ResultCode};

use crate::components::{
    BackendComponent, ComponentError, ComponentId, ComponentRegistration, HookError,
    ServiceLocator,
};
use crate::dispatch::{HandlerError, HandlerReply, MessageHandler, RequestContext};

/// Message type served by [`ShadowConfigComponent`], clashing with the
/// built-in get-config handler.
pub(crate) const SHADOW_CONFIG_TYPE: MessageType = MessageType::GET_CONFIG;

/// Shared, ordered record of hook invocations such as `"Alpha.initiate"`.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub(crate) fn record(&self, entry: impl Into<String>) {
        self.0.lock().expect("event log poisoned").push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().expect("event log poisoned").clone()
    }

    pub(crate) fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|logged| *logged == entry).count()
    }

    pub(crate) fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|logged| logged == entry)
    }
}

/// Behaviour knobs for probe components.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProbeBehaviour {
    pub(crate) dependencies: Vec<ComponentId>,
    pub(crate) fail_initiate: bool,
    pub(crate) fail_safety_check: bool,
    pub(crate) fail_unload: bool,
}

impl ProbeBehaviour {
    pub(crate) fn depends_on(dependencies: Vec<ComponentId>) -> Self {
        Self {
            dependencies,
            ..Self::default()
        }
    }
}

macro_rules! probe_component {
    ($name:ident) => {
        pub(crate) struct $name {
            log: EventLog,
            behaviour: ProbeBehaviour,
        }

        impl $name {
            pub(crate) fn registration(
                log: &EventLog,
                behaviour: ProbeBehaviour,
            ) -> ComponentRegistration {
                let log = log.clone();
                ComponentRegistration::with_constructor(move || Self {
                    log: log.clone(),
                    behaviour: behaviour.clone(),
                })
            }

            fn hook(&self, hook: &str, fail: bool) -> Result<(), HookError> {
                self.log.record(format!("{}.{hook}", stringify!($name)));
                if fail {
                    return Err(format!("{} refused {hook}", stringify!($name)).into());
                }
                Ok(())
            }
        }

        impl BackendComponent for $name {
            fn dependencies(&self) -> Vec<ComponentId> {
                self.behaviour.dependencies.clone()
            }

            fn inject(&self, _locator: &ServiceLocator<'_>) -> Result<(), ComponentError> {
                self.log.record(concat!(stringify!($name), ".inject"));
                Ok(())
            }

            fn initiate(&self) -> Result<(), HookError> {
                self.hook("initiate", self.behaviour.fail_initiate)
            }

            fn safety_check(&self) -> Result<(), HookError> {
                self.hook("safety_check", self.behaviour.fail_safety_check)
            }

            fn unload(&self) -> Result<(), HookError> {
                self.hook("unload", self.behaviour.fail_unload)
            }
        }
    };
}

probe_component!(Alpha);
probe_component!(Beta);
probe_component!(Gamma);

/// Maps a probe name used in feature files to its component id.
pub(crate) fn probe_id(name: &str) -> Result<ComponentId, String> {
    match name {
        "Alpha" => Ok(ComponentId::of::<Alpha>()),
        "Beta" => Ok(ComponentId::of::<Beta>()),
        "Gamma" => Ok(ComponentId::of::<Gamma>()),
        other => Err(format!("unknown probe component '{other}'")),
    }
}

/// Session-gated chat handler that replies with the caller's user id.
#[derive(Debug, Default)]
pub(crate) struct ChatComponent;

impl ChatComponent {
    pub(crate) const SEND: MessageType = MessageType(0x50);
}

impl BackendComponent for ChatComponent {
    fn handlers(self: Arc<Self>) -> Vec<Arc<dyn MessageHandler>> {
        vec![self as Arc<dyn MessageHandler>]
    }
}

impl MessageHandler for ChatComponent {
    fn message_type(&self) -> MessageType {
        Self::SEND
    }

    fn requires_session(&self) -> bool {
        true
    }

    fn handle(
        &self,
        context: &RequestContext<'_>,
        _payload: &[u8],
    ) -> Result<HandlerReply, HandlerError> {
        let session = context
            .session
            .ok_or_else(|| HandlerError::new("session missing past the gate"))?;
        Ok(HandlerReply {
            result_code: ResultCode::SUCCESS,
            payload: session.user_id().as_bytes().to_vec(),
        })
    }
}

/// Claims the get-config message type a second time.
#[derive(Debug, Default)]
pub(crate) struct ShadowConfigComponent;

impl BackendComponent for ShadowConfigComponent {
    fn handlers(self: Arc<Self>) -> Vec<Arc<dyn MessageHandler>> {
        vec![self as Arc<dyn MessageHandler>]
    }
}

impl MessageHandler for ShadowConfigComponent {
    fn message_type(&self) -> MessageType {
        SHADOW_CONFIG_TYPE
    }

    fn handle(
        &self,
        _context: &RequestContext<'_>,
        _payload: &[u8],
    ) -> Result<HandlerReply, HandlerError> {
        Ok(HandlerReply::failure(ResultCode::GENERIC_ERROR))
    }
}

/// Serves handlers that fail: one returns an error, one panics.
#[derive(Debug, Default)]
pub(crate) struct FaultyComponent;

impl FaultyComponent {
    pub(crate) const FAIL: MessageType = MessageType(0x51);
    pub(crate) const PANIC: MessageType = MessageType(0x52);
}

impl BackendComponent for FaultyComponent {
    fn handlers(self: Arc<Self>) -> Vec<Arc<dyn MessageHandler>> {
        vec![Arc::new(ErroringHandler), Arc::new(PanickingHandler)]
    }
}

struct ErroringHandler;

impl MessageHandler for ErroringHandler {
    fn message_type(&self) -> MessageType {
        FaultyComponent::FAIL
    }

    fn handle(
        &self,
        _context: &RequestContext<'_>,
        _payload: &[u8],
    ) -> Result<HandlerReply, HandlerError> {
        Err(HandlerError::new("handler refused the request"))
    }
}

struct PanickingHandler;

impl MessageHandler for PanickingHandler {
    fn message_type(&self) -> MessageType {
        FaultyComponent::PANIC
    }

    fn handle(
        &self,
        _context: &RequestContext<'_>,
        _payload: &[u8],
    ) -> Result<HandlerReply, HandlerError> {
        panic!("handler bug");
    }
}
