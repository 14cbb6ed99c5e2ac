use mockito::Server;
use serde_json::json;

pub struct MockAcmeServer {
    pub server: mockito::ServerGuard,
}

impl MockAcmeServer {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        Self { server }
    }

    pub fn url(&self) -> String {
        self.server.url()
    }

    pub async fn mock_directory(&mut self) -> mockito::Mock {
        let url = self.url();
        self.server
            .mock("GET", "/directory")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "newNonce": format!("{}/new-nonce", url),
                    "newAccount": format!("{}/new-account", url),
                    "newOrder": format!("{}/new-order", url),
                    "revokeCert": format!("{}/revoke-cert", url),
                    "keyChange": format!("{}/key-change", url),
                    "renewalInfo": format!("{}/renewal-info", url),
                    "meta": {
                        "termsOfService": "https://example.com/tos"
                    }
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    pub async fn mock_new_nonce(&mut self) -> mockito::Mock {
        self.server
            .mock("HEAD", "/new-nonce")
            .with_status(200)
            .with_header("replay-nonce", "test-nonce-123")
            .create_async()
            .await
    }

    pub async fn mock_new_account(&mut self) -> mockito::Mock {
        self.server
            .mock("POST", "/new-account")
            .with_status(201)
            .with_header("location", &format!("{}/account/1", self.url()))
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "status": "valid",
                    "contact": ["mailto:admin@example.com"],
                    "orders": format!("{}/account/1/orders", self.url())
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    pub async fn mock_new_order(&mut self) -> mockito::Mock {
        let url = self.url();
        self.server
            .mock("POST", "/new-order")
            .with_status(201)
            .with_header("location", &format!("{}/order/1", url))
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "status": "pending",
                    "expires": "2026-02-10T00:00:00Z",
                    "identifiers": [{"type": "dns", "value": "example.com"}],
                    "authorizations": [format!("{}/authz/1", url)],
                    "finalize": format!("{}/order/1/finalize", url)
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    pub async fn mock_authorization(&mut self) -> mockito::Mock {
        let url = self.url();
        self.server
            .mock("POST", "/authz/1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "identifier": {"type": "dns", "value": "example.com"},
                    "status": "pending",
                    "expires": "2026-02-10T00:00:00Z",
                    "challenges": [
                        {"type": "http-01", "url": format!("{}/chall/1", url), "status": "pending", "token": "token-abc"}
                    ],
                    "wildcard": false
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    pub async fn mock_challenge_trigger(&mut self) -> mockito::Mock {
        let url = self.url();
        self.server
            .mock("POST", "/chall/1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "type": "http-01",
                    "url": format!("{}/chall/1", url),
                    "status": "processing",
                    "token": "token-abc"
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    pub async fn mock_finalize(&mut self) -> mockito::Mock {
        let url = self.url();
        self.server
            .mock("POST", "/order/1/finalize")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "status": "valid",
                    "identifiers": [{"type": "dns", "value": "example.com"}],
                    "authorizations": [format!("{}/authz/1", url)],
                    "finalize": format!("{}/order/1/finalize", url),
                    "certificate": format!("{}/certificate/1", url)
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    pub async fn mock_certificate(&mut self, pem: &str) -> mockito::Mock {
        self.server
            .mock("POST", "/certificate/1")
            .with_status(200)
            .with_header("content-type", "application/pem-certificate-chain")
            .with_body(pem)
            .create_async()
            .await
    }

    pub async fn mock_revoke(&mut self) -> mockito::Mock {
        self.server
            .mock("POST", "/revoke-cert")
            .with_status(200)
            .create_async()
            .await
    }
}
