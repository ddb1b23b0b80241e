//! Peer address of the request

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};

/// IP address of the TCP peer, if the server recorded one
///
/// Never fails: requests served without connect info yield `None`.
pub struct OriginAddr(pub Option<String>);

impl<S> FromRequestParts<S> for OriginAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Same lookup as `ConnectInfo`, including its `MockConnectInfo` fallback
        let peer = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(OriginAddr(peer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Option<String> {
        let (mut parts, _) = request.into_parts();
        let OriginAddr(ip) = OriginAddr::from_request_parts(&mut parts, &()).await.unwrap();
        ip
    }

    #[tokio::test]
    async fn test_reads_connect_info() {
        let request = Request::builder()
            .extension(ConnectInfo(SocketAddr::from(([192, 168, 4, 20], 51000))))
            .body(())
            .unwrap();

        assert_eq!(extract(request).await.as_deref(), Some("192.168.4.20"));
    }

    #[tokio::test]
    async fn test_falls_back_to_mock_connect_info() {
        let request = Request::builder()
            .extension(MockConnectInfo(SocketAddr::from(([10, 1, 2, 3], 40000))))
            .body(())
            .unwrap();

        assert_eq!(extract(request).await.as_deref(), Some("10.1.2.3"));
    }

    #[tokio::test]
    async fn test_none_without_connect_info() {
        let request = Request::builder().body(()).unwrap();

        assert_eq!(extract(request).await, None);
    }
}
