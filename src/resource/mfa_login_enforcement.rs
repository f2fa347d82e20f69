//! `vault_mfa_login_enforcement`: which logins must pass which MFA methods.

use crate::error::ProviderError;
use crate::field::{
    decode_data, decode_string, decode_string_set, encode_payload, encode_string,
    encode_string_set, Field,
};
use crate::resource::{ReadOutcome, Resource};
use crate::schema::{validate_no_trailing_slash, Attribute, AttributeKind, Schema};
use crate::vault::common::trim_path;
use crate::vault::LogicalBackend;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

const LOGIN_ENFORCEMENT_ROOT: &str = "identity/mfa/login-enforcement";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MfaLoginEnforcement {
    pub name: String,
    #[serde(default)]
    pub mfa_method_ids: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_method_accessors: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_method_types: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_group_ids: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_entity_ids: Option<BTreeSet<String>>,
}

impl MfaLoginEnforcement {
    /// True when at least one of the login-selecting sets has a member.
    fn has_target(&self) -> bool {
        [
            &self.auth_method_accessors,
            &self.auth_method_types,
            &self.identity_group_ids,
            &self.identity_entity_ids,
        ]
        .into_iter()
        .any(|set| set.as_ref().is_some_and(|s| !s.is_empty()))
    }
}

pub fn login_enforcement_path(name: &str) -> String {
    format!("{}/{}", LOGIN_ENFORCEMENT_ROOT, trim_path(name))
}

fn fields() -> [Field<MfaLoginEnforcement>; 6] {
    [
        Field::new(
            "name",
            "name",
            |c: &MfaLoginEnforcement| encode_string(trim_path(&c.name)),
            |c: &mut MfaLoginEnforcement, v: Option<&Value>| {
                c.name = decode_string("name", v)?.unwrap_or_default();
                Ok(())
            },
        ),
        Field::new(
            "mfa_method_ids",
            "mfa_method_ids",
            |c: &MfaLoginEnforcement| encode_string_set(&Some(c.mfa_method_ids.clone())),
            |c: &mut MfaLoginEnforcement, v: Option<&Value>| {
                c.mfa_method_ids = decode_string_set("mfa_method_ids", v)?.unwrap_or_default();
                Ok(())
            },
        ),
        Field::new(
            "auth_method_accessors",
            "auth_method_accessors",
            |c: &MfaLoginEnforcement| encode_string_set(&c.auth_method_accessors),
            |c: &mut MfaLoginEnforcement, v: Option<&Value>| {
                c.auth_method_accessors = decode_string_set("auth_method_accessors", v)?;
                Ok(())
            },
        ),
        Field::new(
            "auth_method_types",
            "auth_method_types",
            |c: &MfaLoginEnforcement| encode_string_set(&c.auth_method_types),
            |c: &mut MfaLoginEnforcement, v: Option<&Value>| {
                c.auth_method_types = decode_string_set("auth_method_types", v)?;
                Ok(())
            },
        ),
        Field::new(
            "identity_group_ids",
            "identity_group_ids",
            |c: &MfaLoginEnforcement| encode_string_set(&c.identity_group_ids),
            |c: &mut MfaLoginEnforcement, v: Option<&Value>| {
                c.identity_group_ids = decode_string_set("identity_group_ids", v)?;
                Ok(())
            },
        ),
        Field::new(
            "identity_entity_ids",
            "identity_entity_ids",
            |c: &MfaLoginEnforcement| encode_string_set(&c.identity_entity_ids),
            |c: &mut MfaLoginEnforcement, v: Option<&Value>| {
                c.identity_entity_ids = decode_string_set("identity_entity_ids", v)?;
                Ok(())
            },
        ),
    ]
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MfaLoginEnforcementResource;

#[async_trait]
impl Resource for MfaLoginEnforcementResource {
    type Config = MfaLoginEnforcement;

    const TYPE_NAME: &'static str = "vault_mfa_login_enforcement";

    fn schema(&self) -> Schema {
        Schema::new("Manages an MFA login enforcement configuration.")
            .attribute(
                Attribute::required("name", AttributeKind::String)
                    .describe("Name for this login enforcement configuration.")
                    .validate_with(validate_no_trailing_slash),
            )
            .attribute(
                Attribute::required("mfa_method_ids", AttributeKind::StringSet).describe(
                    "Array of MFA method UUIDs to use. These will be ORed together, meaning if \
                     several IDs are specified, any one of them is sufficient to login.",
                ),
            )
            .attribute(
                Attribute::optional("auth_method_accessors", AttributeKind::StringSet).describe(
                    "Array of auth mount accessor IDs. If present, only auth methods \
                     corresponding to the given accessors are checked during login.",
                ),
            )
            .attribute(
                Attribute::optional("auth_method_types", AttributeKind::StringSet).describe(
                    "Array of auth method types. If present, only auth methods corresponding \
                     to the given types are checked during login.",
                ),
            )
            .attribute(
                Attribute::optional("identity_group_ids", AttributeKind::StringSet).describe(
                    "Array of identity group IDs. If present, only entities belonging to one \
                     of the given groups are checked during login.",
                ),
            )
            .attribute(
                Attribute::optional("identity_entity_ids", AttributeKind::StringSet).describe(
                    "Array of identity entity IDs. If present, only entities with the given \
                     IDs are checked during login.",
                ),
            )
    }

    fn id(&self, config: &MfaLoginEnforcement) -> String {
        trim_path(&config.name).to_string()
    }

    fn validate(&self, config: &MfaLoginEnforcement) -> Result<(), ProviderError> {
        if trim_path(&config.name).is_empty() {
            return Err(ProviderError::validation("name must not be empty"));
        }
        if !config.has_target() {
            return Err(ProviderError::validation(
                "One of auth_method_accessors, auth_method_types, identity_group_ids, \
                 identity_entity_ids must be set.",
            ));
        }
        Ok(())
    }

    fn requires_replace(&self, prior: &MfaLoginEnforcement, desired: &MfaLoginEnforcement) -> bool {
        trim_path(&prior.name) != trim_path(&desired.name)
    }

    async fn write(
        &self,
        client: &dyn LogicalBackend,
        config: &MfaLoginEnforcement,
        _prior: Option<&MfaLoginEnforcement>,
    ) -> Result<(), ProviderError> {
        let path = login_enforcement_path(&config.name);
        let payload = encode_payload(&fields(), config);
        debug!("Updating MFA login enforcement {} in Vault", path);
        client
            .write(&path, payload)
            .await
            .map_err(ProviderError::writing)?;
        debug!("Wrote MFA login enforcement {} in Vault", path);
        Ok(())
    }

    async fn read(
        &self,
        client: &dyn LogicalBackend,
        id: &str,
    ) -> Result<ReadOutcome<MfaLoginEnforcement>, ProviderError> {
        let path = login_enforcement_path(id);
        let Some(secret) = client.read(&path).await.map_err(ProviderError::reading)? else {
            return Ok(ReadOutcome::Gone);
        };
        debug!("Read MFA login enforcement {}", path);
        let mut config: MfaLoginEnforcement =
            decode_data(&fields(), &secret.data).map_err(ProviderError::reading)?;
        if config.name.is_empty() {
            config.name = trim_path(id).to_string();
        }
        Ok(ReadOutcome::Found(config))
    }

    async fn delete(&self, client: &dyn LogicalBackend, id: &str) -> Result<(), ProviderError> {
        let path = login_enforcement_path(id);
        debug!("Deleting MFA login enforcement {} from Vault", path);
        client.delete(&path).await.map_err(ProviderError::deleting)
    }
}
