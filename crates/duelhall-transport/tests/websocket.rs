//! Integration tests for the WebSocket transport.
//!
//! A real listener and a real `tokio-tungstenite` client, so the frame
//! conversions (text vs. binary, close handling) are exercised end to end.

#[cfg(feature = "websocket")]
mod websocket {
    use duelhall_transport::{Connection, Transport, WebSocketTransport};
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds on an OS-assigned port and returns the transport plus the
    /// address a client should dial.
    async fn bind_ephemeral() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("local addr").to_string();
        (transport, addr)
    }

    async fn connect_client(addr: &str) -> ClientWs {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        ws
    }

    #[tokio::test]
    async fn test_websocket_json_frames_go_out_as_text() {
        let (mut transport, addr) = bind_ephemeral().await;
        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let mut client = connect_client(&addr).await;
        let conn = server.await.expect("accept task");

        assert!(conn.id().into_inner() > 0);

        conn.send(br#"{"event":"gameStarted"}"#)
            .await
            .expect("send should succeed");

        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_text(), "utf-8 payloads should be text frames");
        assert_eq!(msg.into_data().as_ref(), br#"{"event":"gameStarted"}"#);
    }

    #[tokio::test]
    async fn test_websocket_recv_accepts_text_and_binary() {
        let (mut transport, addr) = bind_ephemeral().await;
        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let mut client = connect_client(&addr).await;
        let conn = server.await.unwrap();

        client.send(Message::Text("hello".into())).await.unwrap();
        client
            .send(Message::Binary(b"world".to_vec().into()))
            .await
            .unwrap();

        assert_eq!(conn.recv().await.unwrap().unwrap(), b"hello");
        assert_eq!(conn.recv().await.unwrap().unwrap(), b"world");
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (mut transport, addr) = bind_ephemeral().await;
        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let mut client = connect_client(&addr).await;
        let conn = server.await.unwrap();

        client.send(Message::Close(None)).await.unwrap();

        let result = conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_websocket_each_connection_gets_distinct_id() {
        let (mut transport, addr) = bind_ephemeral().await;
        let server = tokio::spawn(async move {
            let a = transport.accept().await.expect("first");
            let b = transport.accept().await.expect("second");
            (a, b)
        });
        let _c1 = connect_client(&addr).await;
        let _c2 = connect_client(&addr).await;
        let (a, b) = server.await.unwrap();

        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_websocket_plain_http_client_fails_handshake() {
        use duelhall_transport::TransportError;
        use tokio::io::AsyncWriteExt;

        let (mut transport, addr) = bind_ephemeral().await;
        let server = tokio::spawn(async move { transport.accept().await });

        let mut raw = tokio::net::TcpStream::connect(&addr).await.unwrap();
        raw.write_all(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n")
            .await
            .unwrap();
        let result = server.await.unwrap();

        match result {
            Err(err @ TransportError::Handshake { .. }) => {
                assert!(err.is_per_client());
            }
            Err(other) => panic!("expected a handshake error, got {other}"),
            Ok(_) => panic!("a plain HTTP request must not upgrade"),
        }
    }

    #[tokio::test]
    async fn test_websocket_connection_reports_peer_addr() {
        let (mut transport, addr) = bind_ephemeral().await;
        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let _client = connect_client(&addr).await;
        let conn = server.await.unwrap();

        assert!(conn.peer_addr().ip().is_loopback());
    }
}
