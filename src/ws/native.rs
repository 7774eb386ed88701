//! Native transport: `tokio-tungstenite`.
//!
//! Opens the socket with a timeout and adapts it to [`Link`]: text frames
//! pass through, close frames carry their code, and control/binary frames
//! are dropped (tungstenite answers pings on its own).

use std::time::Duration;

use futures_util::future::{self, BoxFuture};
use futures_util::{FutureExt, SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as TungsteniteError, Message};

use crate::error::WsError;
use crate::ws::transport::{Connector, Frame, Link};

/// [`Connector`] backed by `tokio-tungstenite`.
#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
    connect_timeout: Duration,
}

impl TungsteniteConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for TungsteniteConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl Connector for TungsteniteConnector {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Link, WsError>> {
        let url = url.to_string();
        let timeout = self.connect_timeout;
        async move {
            let (ws_stream, _) = tokio::time::timeout(timeout, connect_async(url.as_str()))
                .await
                .map_err(|_| WsError::ConnectionFailed("Connection timeout".to_string()))?
                .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;
            tracing::debug!(url = %url, "WebSocket opened");

            let (sink, stream) = ws_stream.split();
            let sink = sink
                .sink_map_err(|e| WsError::SendFailed(e.to_string()))
                .with(|text: String| future::ready(Ok::<_, WsError>(Message::Text(text.into()))));
            let stream = stream.filter_map(|msg| future::ready(to_frame(msg)));

            Ok(Link::new(Box::pin(sink), Box::pin(stream)))
        }
        .boxed()
    }
}

fn to_frame(msg: Result<Message, TungsteniteError>) -> Option<Result<Frame, WsError>> {
    match msg {
        Ok(Message::Text(text)) => {
            let text: &str = text.as_ref();
            Some(Ok(Frame::Text(text.to_string())))
        }
        Ok(Message::Close(frame)) => {
            let (code, reason) = extract_close(frame.as_ref());
            Some(Ok(Frame::Close {
                code: Some(code),
                reason,
            }))
        }
        Ok(_) => None,
        Err(e) => Some(Err(WsError::ProtocolError(e.to_string()))),
    }
}

/// Extract close code and reason from an optional CloseFrame.
fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (1006, "No close frame".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

    #[test]
    fn test_extract_close_with_frame() {
        let frame = CloseFrame {
            code: CloseCode::Away,
            reason: "server restart".into(),
        };
        let (code, reason) = extract_close(Some(&frame));
        assert_eq!(code, 1001);
        assert_eq!(reason, "server restart");
    }

    #[test]
    fn test_extract_close_no_frame() {
        assert_eq!(extract_close(None), (1006, "No close frame".to_string()));
    }

    #[test]
    fn test_control_frames_are_dropped() {
        assert!(to_frame(Ok(Message::Ping(Vec::new().into()))).is_none());
        assert!(to_frame(Ok(Message::Binary(Vec::new().into()))).is_none());
        assert_eq!(
            to_frame(Ok(Message::Text("hi".into()))),
            Some(Ok(Frame::Text("hi".to_string())))
        );
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_host_fails() {
        let connector = TungsteniteConnector::new(Duration::from_secs(2));
        let result = connector.connect("ws://127.0.0.1:9/live/1").await;
        assert!(matches!(result, Err(WsError::ConnectionFailed(_))));
    }
}
