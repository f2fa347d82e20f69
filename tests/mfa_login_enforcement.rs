//! Acceptance test for `vault_mfa_login_enforcement` against a real Vault.

mod common;

use common::{random_name, read_data, write_data, VaultFixture};
use serde_json::{json, Value};
use vaultform::{LogicalBackend, VaultClient};

/// Creates the MFA method, auth mount, entity and group an enforcement can target.
async fn prerequisites(client: &VaultClient) -> (String, String, String, String) {
    let method = write_data(
        client,
        "identity/mfa/method/duo",
        json!({
            "secret_key": "8C7THtrIigh2rPZQMbguugt8IUftWhMRCOBzbuyz",
            "integration_key": "BIACEUEAXI20BNWTEYXT",
            "api_hostname": "api-2b5c39f5.duosecurity.com"
        }),
    )
    .await;
    let method_id = method["method_id"].as_str().unwrap().to_string();

    let userpass = random_name("userpass");
    write_data(
        client,
        &format!("sys/auth/{}", userpass),
        json!({"type": "userpass"}),
    )
    .await;
    let auths = read_data(client, "sys/auth").await;
    let accessor = auths[format!("{}/", userpass)]["accessor"]
        .as_str()
        .unwrap()
        .to_string();

    let entity = write_data(
        client,
        "identity/entity",
        json!({"name": random_name("entity")}),
    )
    .await;
    let entity_id = entity["id"].as_str().unwrap().to_string();

    let group = write_data(
        client,
        "identity/group",
        json!({"name": random_name("group")}),
    )
    .await;
    let group_id = group["id"].as_str().unwrap().to_string();

    (method_id, accessor, entity_id, group_id)
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_mfa_login_enforcement_lifecycle() {
    let vault = VaultFixture::start().await;
    let client = vault.client();
    let provider = vault.provider();
    let (method_id, accessor, entity_id, group_id) = prerequisites(&client).await;

    let name = random_name("enforcement");
    let config = json!({
        "name": name,
        "mfa_method_ids": [method_id],
        "auth_method_accessors": [accessor],
        "auth_method_types": ["userpass"],
        "identity_group_ids": [group_id],
        "identity_entity_ids": [entity_id]
    });

    let state = provider
        .apply("vault_mfa_login_enforcement", None, config)
        .await
        .unwrap();
    assert_eq!(state["id"], name.as_str());

    let remote = read_data(
        &client,
        &format!("identity/mfa/login-enforcement/{}", name),
    )
    .await;
    for key in [
        "mfa_method_ids",
        "auth_method_accessors",
        "auth_method_types",
        "identity_group_ids",
        "identity_entity_ids",
    ] {
        assert_eq!(state["attributes"][key], remote[key], "{} differs", key);
    }
    assert_eq!(state["attributes"]["auth_method_types"], json!(["userpass"]));

    let imported = provider
        .import("vault_mfa_login_enforcement", &name)
        .await
        .unwrap();
    assert_eq!(imported, state);

    provider
        .destroy("vault_mfa_login_enforcement", state.clone())
        .await
        .unwrap();
    assert!(client
        .read(&format!("identity/mfa/login-enforcement/{}", name))
        .await
        .unwrap()
        .is_none());

    let refreshed = provider
        .refresh("vault_mfa_login_enforcement", state)
        .await
        .unwrap();
    assert_eq!(refreshed["id"], Value::Null);
}
