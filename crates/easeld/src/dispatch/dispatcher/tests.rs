//! Unit tests for request routing and session gating.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use rstest::{fixture, rstest};

use super::*;
use crate::dispatch::{HandlerError, HandlerReply};

const GATED: MessageType = MessageType(0x50);
const OPEN: MessageType = MessageType(0x10);
const FAILING: MessageType = MessageType(0x20);

struct EchoHandler {
    message_type: MessageType,
    gated: bool,
    calls: AtomicUsize,
}

impl EchoHandler {
    fn new(message_type: MessageType, gated: bool) -> Arc<Self> {
        Arc::new(Self {
            message_type,
            gated,
            calls: AtomicUsize::new(0),
        })
    }
}

impl MessageHandler for EchoHandler {
    fn message_type(&self) -> MessageType {
        self.message_type
    }

    fn requires_session(&self) -> bool {
        self.gated
    }

    fn handle(
        &self,
        context: &RequestContext<'_>,
        payload: &[u8],
    ) -> Result<HandlerReply, HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if context.message_type == FAILING {
            return Err(HandlerError::new("storage offline"));
        }
        let mut body = payload.to_vec();
        body.reverse();
        Ok(HandlerReply::success(body))
    }
}

struct Fixture {
    dispatcher: MessageDispatcher,
    gated: Arc<EchoHandler>,
    open: Arc<EchoHandler>,
}

#[fixture]
fn fixture() -> Fixture {
    let gated = EchoHandler::new(GATED, true);
    let open = EchoHandler::new(OPEN, false);
    let mut dispatcher = MessageDispatcher::new();
    dispatcher
        .register(Arc::clone(&gated) as Arc<dyn MessageHandler>)
        .expect("register gated");
    dispatcher
        .register(Arc::clone(&open) as Arc<dyn MessageHandler>)
        .expect("register open");
    dispatcher
        .register(EchoHandler::new(FAILING, false))
        .expect("register failing");
    Fixture {
        dispatcher,
        gated,
        open,
    }
}

fn caller() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 40000))
}

fn live_session() -> Session {
    Session::new("tok", "ada", SystemTime::now() + Duration::from_secs(600))
}

fn expired_session() -> Session {
    Session::new("tok", "ada", SystemTime::now() - Duration::from_secs(1))
}

#[rstest]
fn handler_replies_echo_request_identity(fixture: Fixture) {
    let request = RequestFrame::new("c-1", OPEN, "tok", vec![1, 2, 3]);
    let response = fixture
        .dispatcher
        .handle(&request, None, caller())
        .expect("dispatch");

    assert_eq!(response.correlation_id, "c-1");
    assert_eq!(response.session_token, "tok");
    assert_eq!(response.result_code, ResultCode::SUCCESS);
    assert_eq!(response.payload, vec![3, 2, 1]);
    assert_eq!(fixture.open.calls.load(Ordering::SeqCst), 1);
}

#[rstest]
#[case(None)]
#[case(Some(expired_session()))]
fn gated_types_require_a_live_session(fixture: Fixture, #[case] session: Option<Session>) {
    let request = RequestFrame::new("c-2", GATED, "tok", vec![9]);
    let response = fixture
        .dispatcher
        .handle(&request, session.as_ref(), caller())
        .expect("dispatch");

    assert_eq!(response.result_code, ResultCode::LOGIN_REQUIRED);
    assert!(response.payload.is_empty());
    assert_eq!(fixture.gated.calls.load(Ordering::SeqCst), 0);
}

#[rstest]
fn gated_types_accept_a_live_session(fixture: Fixture) {
    let session = live_session();
    let request = RequestFrame::new("c-3", GATED, "tok", vec![4, 5]);
    let response = fixture
        .dispatcher
        .handle(&request, Some(&session), caller())
        .expect("dispatch");

    assert_eq!(response.result_code, ResultCode::SUCCESS);
    assert_eq!(fixture.gated.calls.load(Ordering::SeqCst), 1);
}

#[rstest]
fn unknown_types_answer_generic_error(fixture: Fixture) {
    let request = RequestFrame::new("c-4", MessageType(0x7F), "", vec![1]);
    let response = fixture
        .dispatcher
        .handle(&request, None, caller())
        .expect("dispatch");

    assert_eq!(response.correlation_id, "c-4");
    assert_eq!(response.result_code, ResultCode::GENERIC_ERROR);
    assert!(response.payload.is_empty());
}

#[rstest]
fn handler_errors_surface_to_the_connection(fixture: Fixture) {
    let request = RequestFrame::new("c-5", FAILING, "", Vec::new());
    let error = fixture
        .dispatcher
        .handle(&request, None, caller())
        .expect_err("handler should fail");

    assert!(matches!(
        error,
        DispatchError::Handler {
            message_type: FAILING,
            ..
        }
    ));
}

#[rstest]
fn second_handler_for_a_type_is_rejected(mut fixture: Fixture) {
    let error = fixture
        .dispatcher
        .register(EchoHandler::new(OPEN, true))
        .expect_err("duplicate handler");

    assert!(matches!(
        error,
        DispatchError::DuplicateHandler { message_type: OPEN }
    ));
    assert!(fixture.dispatcher.handles(OPEN));
}
