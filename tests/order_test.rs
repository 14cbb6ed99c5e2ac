mod common;

use acmex::prelude::*;
use acmex::transport::ReqwestTransport;
use common::MockAcmeServer;
use std::sync::Arc;

#[tokio::test]
async fn certificate_order_flow() -> Result<()> {
    let mut mock_server = MockAcmeServer::new().await;
    let url = mock_server.url();

    let _m_dir = mock_server.mock_directory().await;
    let _m_nonce = mock_server.mock_new_nonce().await;
    let _m_account = mock_server.mock_new_account().await;
    let _m_order = mock_server.mock_new_order().await;
    let _m_authz = mock_server.mock_authorization().await;
    let _m_chall = mock_server.mock_challenge_trigger().await;
    let _m_finalize = mock_server.mock_finalize().await;

    let params = rcgen::CertificateParams::new(vec!["example.com".to_string()]).unwrap();
    let leaf_key = rcgen::KeyPair::generate().unwrap();
    let cert = params.self_signed(&leaf_key).unwrap();
    let _m_cert = mock_server.mock_certificate(&cert.pem()).await;

    let session = Arc::new(Session::new(format!("{url}/directory"), Arc::new(ReqwestTransport::default())));

    let key = KeyPair::generate(KeyType::EcdsaP256)?;
    let login = AccountBuilder::new()
        .add_contact(Contact::email("admin@example.com"))
        .agree_to_terms_of_service()
        .use_key_pair(key)
        .create_login(session)
        .await?;

    let account = Account::bind(login.account_url.clone(), login.clone());
    let order = account.new_order().domain("example.com").create().await?;
    assert_eq!(order.location(), format!("{url}/order/1"));

    let authorizations = order.authorizations().await?;
    assert_eq!(authorizations.len(), 1);

    let challenge = authorizations[0]
        .find_challenge("http-01")
        .await?
        .expect("http-01 challenge offered");
    assert_eq!(challenge.token().await?, "token-abc");

    let triggered = challenge.trigger().await?;
    assert_eq!(triggered.status, Status::Processing);

    // Validation has completed out of band; simulate the order having
    // moved to `ready` the way a prior `wait_until_status` would have
    // observed it.
    let mut ready_data = order.get().await?;
    ready_data.status = Status::Ready;
    order.set_cached(ready_data).await;

    let finalized = order
        .finalize(b"fake-csr-der", std::time::Duration::from_secs(30))
        .await?;
    assert_eq!(finalized.status, Status::Valid);

    let certificate = order.get_certificate().await?;
    let chain = certificate.chain().await?;
    assert_eq!(chain.common_name()?, "example.com");

    Ok(())
}
