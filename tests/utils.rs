use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

//Canned HTTP/1.1 response with a correct content-length
pub fn http_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    )
}

//One-shot backend stand-in: accepts a single connection, hands the raw
//request back for inspection and writes the canned response.
pub async fn spawn_backend(response: String) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test backend");
    let addr = listener
        .local_addr()
        .expect("Failed to read test backend addr");
    let (request_tx, request_rx) = oneshot::channel();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let _ = request_tx.send(String::from_utf8_lossy(&buf[..n]).to_string());
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });

    (format!("http://{}", addr), request_rx)
}
