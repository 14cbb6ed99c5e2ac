mod common;

use acmex::prelude::*;
use acmex::transport::ReqwestTransport;
use common::MockAcmeServer;
use std::sync::Arc;

#[tokio::test]
async fn full_account_lifecycle() -> Result<()> {
    let mut mock_server = MockAcmeServer::new().await;
    let _m_dir = mock_server.mock_directory().await;
    let _m_nonce = mock_server.mock_new_nonce().await;
    let _m_account = mock_server.mock_new_account().await;

    let session = Arc::new(Session::new(
        format!("{}/directory", mock_server.url()),
        Arc::new(ReqwestTransport::default()),
    ));

    let key = KeyPair::generate(KeyType::EcdsaP256)?;
    let login = AccountBuilder::new()
        .add_contact(Contact::email("admin@example.com"))
        .agree_to_terms_of_service()
        .use_key_pair(key)
        .create_login(session)
        .await?;

    assert_eq!(login.account_url, format!("{}/account/1", mock_server.url()));

    let account = Account::bind(login.account_url.clone(), login.clone());
    let data = account.get().await?;
    assert_eq!(data.status, Status::Valid);
    assert_eq!(data.contacts(), vec![Contact::email("admin@example.com")]);

    Ok(())
}

#[tokio::test]
async fn only_existing_account_is_rejected_without_a_key() {
    let builder = AccountBuilder::new().only_existing();
    let session = Arc::new(Session::new(
        "https://ca.example/directory",
        Arc::new(ReqwestTransport::default()),
    ));
    let err = builder.create_login(session).await.unwrap_err();
    assert!(matches!(err, AcmeError::InvalidArgument(_)));
}
