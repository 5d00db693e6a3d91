use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::future::BoxFuture;
use obsw_protocol::{
	AuthChallenge, ClientMessage, Hello, Identified, RPC_VERSION, RequestResponse, RequestStatus,
	ServerMessage, authentication_string, close_code,
};

use super::*;
use crate::transport::TransportParts;
use crate::transport::TransportSender;

/// How a scripted remote answers the handshake.
#[derive(Clone, Copy)]
enum Script {
	/// Hello (optionally with a challenge), then Identified.
	Accept { challenge: bool },
	/// Hello with a challenge, then close 4009 on Identify.
	RejectAuth,
	/// Fail the dial itself.
	RefuseDial,
}

#[derive(Default)]
struct RemoteState {
	dials: AtomicUsize,
	live: AtomicUsize,
	sent: parking_lot::Mutex<Vec<Arc<parking_lot::Mutex<Vec<ClientMessage>>>>>,
	feeds: parking_lot::Mutex<Vec<mpsc::UnboundedSender<TransportEvent>>>,
}

/// Scripted remote end. Each dial yields a fresh transport; the test keeps a
/// handle to its inbound feed and outbound record.
struct MockRemote {
	script: Script,
	state: Arc<RemoteState>,
}

impl MockRemote {
	fn new(script: Script) -> Arc<Self> {
		Arc::new(Self {
			script,
			state: Arc::new(RemoteState::default()),
		})
	}

	fn accepting() -> Arc<Self> {
		Self::new(Script::Accept { challenge: false })
	}

	fn challenging() -> Arc<Self> {
		Self::new(Script::Accept { challenge: true })
	}

	fn rejecting_auth() -> Arc<Self> {
		Self::new(Script::RejectAuth)
	}

	fn refusing() -> Arc<Self> {
		Self::new(Script::RefuseDial)
	}

	fn dials(&self) -> usize {
		self.state.dials.load(Ordering::SeqCst)
	}

	fn live(&self) -> usize {
		self.state.live.load(Ordering::SeqCst)
	}

	/// Inbound feed of the `index`th dialed transport.
	fn feed(&self, index: usize) -> mpsc::UnboundedSender<TransportEvent> {
		self.state.feeds.lock()[index].clone()
	}

	/// Frames the client sent on the `index`th dialed transport.
	fn sent(&self, index: usize) -> Vec<ClientMessage> {
		self.state.sent.lock()[index].lock().clone()
	}

	/// The request frame most recently sent on transport `index`.
	fn last_request(&self, index: usize) -> obsw_protocol::Request {
		for message in self.sent(index).into_iter().rev() {
			if let ClientMessage::Request(request) = message {
				return request;
			}
		}
		panic!("no request frame was sent");
	}
}

struct MockSender {
	script: Script,
	sent: Arc<parking_lot::Mutex<Vec<ClientMessage>>>,
	feed: mpsc::UnboundedSender<TransportEvent>,
	state: Arc<RemoteState>,
	closed: bool,
}

impl MockSender {
	fn mark_closed(&mut self) {
		if !self.closed {
			self.closed = true;
			self.state.live.fetch_sub(1, Ordering::SeqCst);
		}
	}
}

impl TransportSender for MockSender {
	fn send(&mut self, message: ClientMessage) -> BoxFuture<'_, Result<()>> {
		if matches!(message, ClientMessage::Identify(_)) {
			match self.script {
				Script::Accept { .. } => {
					let _ = self.feed.send(TransportEvent::Message(ServerMessage::Identified(
						Identified {
							negotiated_rpc_version: RPC_VERSION,
						},
					)));
				}
				Script::RejectAuth => {
					let _ = self.feed.send(TransportEvent::Closed {
						code: Some(close_code::AUTHENTICATION_FAILED),
						reason: Some("Authentication failed.".into()),
					});
				}
				Script::RefuseDial => {}
			}
		}
		self.sent.lock().push(message);
		Box::pin(async { Ok(()) })
	}

	fn close(&mut self) -> BoxFuture<'_, Result<()>> {
		self.mark_closed();
		Box::pin(async { Ok(()) })
	}
}

impl Drop for MockSender {
	fn drop(&mut self) {
		self.mark_closed();
	}
}

impl Connector for MockRemote {
	fn connect(&self, _address: &str) -> BoxFuture<'_, Result<TransportParts>> {
		Box::pin(async move {
			self.state.dials.fetch_add(1, Ordering::SeqCst);
			if matches!(self.script, Script::RefuseDial) {
				return Err(Error::Transport("connection refused".to_owned()));
			}
			self.state.live.fetch_add(1, Ordering::SeqCst);

			let (feed, events) = mpsc::unbounded_channel();
			let sent = Arc::new(parking_lot::Mutex::new(Vec::new()));
			let challenged = matches!(
				self.script,
				Script::Accept { challenge: true } | Script::RejectAuth
			);
			let _ = feed.send(TransportEvent::Message(ServerMessage::Hello(Hello {
				obs_web_socket_version: Some("5.1.0".into()),
				rpc_version: RPC_VERSION,
				authentication: challenged.then(|| AuthChallenge {
					challenge: "c".into(),
					salt: "s".into(),
				}),
			})));
			self.state.sent.lock().push(sent.clone());
			self.state.feeds.lock().push(feed.clone());

			Ok(TransportParts {
				sender: Box::new(MockSender {
					script: self.script,
					sent,
					feed,
					state: self.state.clone(),
					closed: false,
				}),
				events,
			})
		})
	}
}

fn ok_status() -> RequestStatus {
	RequestStatus {
		result: true,
		code: 100,
		comment: None,
	}
}

/// Lets the service tasks run to completion of their queued work.
async fn settle() {
	for _ in 0..8 {
		tokio::task::yield_now().await;
	}
}

const ADDRESS: &str = "ws://localhost:4455";

#[tokio::test]
async fn connect_opens_and_sends_one_identify() {
	let remote = MockRemote::accepting();
	let session = Session::new(remote.clone());
	assert_eq!(session.status().connection, ConnectionStatus::Closed);

	session.connect(ADDRESS, None).await.unwrap();

	assert_eq!(session.status().connection, ConnectionStatus::Open);
	assert_eq!(remote.dials(), 1);
	match &remote.sent(0)[..] {
		[ClientMessage::Identify(identify)] => assert!(identify.authentication.is_none()),
		other => panic!("expected a single Identify, got {other:?}"),
	}
}

#[tokio::test]
async fn ready_callback_fires_exactly_once() {
	let remote = MockRemote::accepting();
	let session = Session::new(remote.clone());
	let fired = Arc::new(AtomicUsize::new(0));
	session.on_ready({
		let fired = fired.clone();
		move || {
			fired.fetch_add(1, Ordering::SeqCst);
		}
	});

	session.connect(ADDRESS, None).await.unwrap();
	assert_eq!(fired.load(Ordering::SeqCst), 1);

	// The slot was consumed; a reconnect without re-registering stays quiet.
	session.connect(ADDRESS, None).await.unwrap();
	assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn challenge_is_answered_with_the_derived_token() {
	let remote = MockRemote::challenging();
	let session = Session::new(remote.clone());

	session.connect(ADDRESS, Some("hunter2")).await.unwrap();

	match &remote.sent(0)[..] {
		[ClientMessage::Identify(identify)] => {
			let expected = authentication_string("hunter2", "s", "c");
			assert_eq!(identify.authentication.as_deref(), Some(expected.as_str()));
		}
		other => panic!("expected a single Identify, got {other:?}"),
	}
}

#[tokio::test]
async fn rejected_credential_lands_in_authentication_error() {
	let remote = MockRemote::rejecting_auth();
	let session = Session::new(remote.clone());

	let err = session.connect(ADDRESS, Some("wrongpass")).await.unwrap_err();

	assert!(err.is_authentication_rejected());
	let status = session.status();
	assert_eq!(status.connection, ConnectionStatus::AuthenticationError);
	assert!(status.last_error.unwrap().contains("Authentication failed."));

	// Still not a session; calls refuse without touching the transport.
	let dials = remote.dials();
	assert!(session.call("GetVideoSettings", None).await.unwrap_err().is_disconnected());
	assert_eq!(remote.dials(), dials);
}

#[tokio::test]
async fn refused_dial_records_error_and_stays_closed() {
	let remote = MockRemote::refusing();
	let session = Session::new(remote.clone());

	let err = session.connect(ADDRESS, None).await.unwrap_err();

	assert!(!err.is_authentication_rejected());
	let status = session.status();
	assert_eq!(status.connection, ConnectionStatus::Closed);
	assert!(status.last_error.unwrap().contains("connection refused"));
}

#[tokio::test]
async fn call_before_connect_rejects_without_dialing() {
	let remote = MockRemote::accepting();
	let session = Session::new(remote.clone());

	let err = session.call("GetVideoSettings", None).await.unwrap_err();

	assert!(err.is_disconnected());
	assert_eq!(remote.dials(), 0);
}

#[tokio::test]
async fn call_resolves_on_the_matching_response() {
	let remote = MockRemote::accepting();
	let session = Arc::new(Session::new(remote.clone()));
	session.connect(ADDRESS, None).await.unwrap();

	let call = tokio::spawn({
		let session = session.clone();
		async move { session.call("GetVideoSettings", None).await }
	});
	settle().await;

	let request = remote.last_request(0);
	assert_eq!(request.request_type, "GetVideoSettings");
	remote
		.feed(0)
		.send(TransportEvent::Message(ServerMessage::RequestResponse(
			RequestResponse {
				request_type: request.request_type,
				request_id: request.request_id,
				request_status: ok_status(),
				response_data: Some(serde_json::json!({ "baseWidth": 1920 })),
			},
		)))
		.unwrap();

	let value = call.await.unwrap().unwrap();
	assert_eq!(value["baseWidth"], 1920);
}

#[tokio::test]
async fn close_rejects_every_outstanding_call() {
	let remote = MockRemote::accepting();
	let session = Arc::new(Session::new(remote.clone()));
	session.connect(ADDRESS, None).await.unwrap();

	let calls: Vec<_> = (0..3)
		.map(|_| {
			tokio::spawn({
				let session = session.clone();
				async move { session.call("GetVideoSettings", None).await }
			})
		})
		.collect();
	settle().await;

	session.close();

	for call in calls {
		assert!(call.await.unwrap().unwrap_err().is_disconnected());
	}
	assert_eq!(session.status().connection, ConnectionStatus::Closed);
	settle().await;

	// A frame arriving after close finds nobody: the dispatch task and its
	// feed are gone.
	assert!(
		remote
			.feed(0)
			.send(TransportEvent::Closed { code: None, reason: None })
			.is_err()
	);
	assert_eq!(remote.live(), 0);
}

#[tokio::test]
async fn close_is_idempotent() {
	let session = Session::new(MockRemote::accepting());
	session.close();
	session.close();
	assert_eq!(session.status().connection, ConnectionStatus::Closed);
}

#[tokio::test]
async fn remote_close_rejects_calls_and_settles_closed() {
	let remote = MockRemote::accepting();
	let session = Arc::new(Session::new(remote.clone()));
	session.connect(ADDRESS, None).await.unwrap();

	let call = tokio::spawn({
		let session = session.clone();
		async move { session.call("GetVideoSettings", None).await }
	});
	settle().await;

	remote
		.feed(0)
		.send(TransportEvent::Closed {
			code: None,
			reason: Some("server is shutting down".into()),
		})
		.unwrap();

	assert!(call.await.unwrap().unwrap_err().is_disconnected());
	settle().await;

	let status = session.status();
	assert_eq!(status.connection, ConnectionStatus::Closed);
	assert!(status.last_error.unwrap().contains("server is shutting down"));
	assert_eq!(remote.live(), 0);
}

#[tokio::test]
async fn reconnect_never_leaves_two_live_transports() {
	let remote = MockRemote::accepting();
	let session = Session::new(remote.clone());

	session.connect(ADDRESS, None).await.unwrap();
	session.connect(ADDRESS, None).await.unwrap();
	settle().await;

	assert_eq!(remote.dials(), 2);
	assert_eq!(remote.live(), 1);
	assert_eq!(session.status().connection, ConnectionStatus::Open);

	// The surviving transport is the second one.
	remote
		.feed(1)
		.send(TransportEvent::Closed { code: None, reason: None })
		.unwrap();
	settle().await;
	assert_eq!(remote.live(), 0);
	assert_eq!(session.status().connection, ConnectionStatus::Closed);
}

#[tokio::test]
async fn dropping_the_session_closes_it() {
	let remote = MockRemote::accepting();
	{
		let session = Session::new(remote.clone());
		session.connect(ADDRESS, None).await.unwrap();
	}
	settle().await;
	assert_eq!(remote.live(), 0);
}

#[tokio::test]
async fn connect_resets_diagnostics_from_the_previous_session() {
	let remote = MockRemote::accepting();
	let session = Session::new(remote.clone());
	session.connect(ADDRESS, None).await.unwrap();
	session.flag_invalid_scene();
	assert!(session.status().invalid_scene_name);

	session.connect(ADDRESS, None).await.unwrap();

	let status = session.status();
	assert!(!status.invalid_scene_name);
	assert!(status.last_error.is_none());
}
