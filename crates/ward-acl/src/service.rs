//! Caller-facing ACL service
//!
//! Bundles a provider, the permission map and the resolution engine behind
//! permission-name based operations: checks, grants, revocations and the
//! batch `set_acl` operation.

use crate::acl::Acl;
use crate::evaluation::AclEvaluator;
use crate::provider::{AclProvider, MutableAclProvider, WardAclProvider};
use crate::voter::AclVoter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ward_core::{
    BasicPermissionMap, ConfigValidation, Entry, MaskBuilder, ObjectIdentity, PermissionMap,
    Result, Scope, SecurityIdentity, WardConfig, WardError,
};
use ward_store::{AclBackend, MemoryBackend};

/// Grant several permissions to several identities on several objects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAclRequest {
    /// Permission names, combined into a single mask
    pub permissions: Vec<String>,
    /// Objects whose ACLs receive the entries, created when missing
    pub object_identities: Vec<ObjectIdentity>,
    /// Users and roles receiving the permissions
    pub security_identities: Vec<SecurityIdentity>,
    /// Insert into the class scope instead of the object scope
    #[serde(default)]
    pub class_scope: bool,
}

impl SetAclRequest {
    /// Request for `permissions` with no targets yet
    pub fn new<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Add a target object
    pub fn object(mut self, object_identity: ObjectIdentity) -> Self {
        self.object_identities.push(object_identity);
        self
    }

    /// Add a receiving user
    pub fn user(mut self, username: &str, class: &str) -> Result<Self> {
        self.security_identities
            .push(SecurityIdentity::user(username, class)?);
        Ok(self)
    }

    /// Add a receiving role
    pub fn role(mut self, role: &str) -> Result<Self> {
        self.security_identities.push(SecurityIdentity::role(role)?);
        Ok(self)
    }

    /// Target the class scope
    pub fn class_scope(mut self) -> Self {
        self.class_scope = true;
        self
    }

    fn scope(&self) -> Scope {
        if self.class_scope {
            Scope::Class
        } else {
            Scope::Object
        }
    }

    /// Combined mask of every requested permission
    pub fn mask(&self) -> Result<ward_core::PermissionMask> {
        let mut builder = MaskBuilder::new();
        for permission in &self.permissions {
            builder.add(permission)?;
        }
        Ok(builder.get())
    }

    /// Reject requests missing permissions, objects or identities
    pub fn validate(&self) -> Result<()> {
        if self.permissions.is_empty() {
            return Err(WardError::invalid("at least one permission is required"));
        }
        if self.object_identities.is_empty() {
            return Err(WardError::invalid("at least one object identity is required"));
        }
        if self.security_identities.is_empty() {
            return Err(WardError::invalid(
                "at least one user or role is required",
            ));
        }
        Ok(())
    }
}

/// ACL operations addressed by permission name
pub struct AclService<B> {
    provider: Arc<WardAclProvider<B>>,
    permission_map: Arc<dyn PermissionMap>,
    evaluator: AclEvaluator,
    config: WardConfig,
}

impl<B: AclBackend> std::fmt::Debug for AclService<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AclService")
            .field("provider", &self.provider)
            .field("evaluator", &self.evaluator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AclService<MemoryBackend> {
    /// Service over a memory backend named after `config.tables`
    pub fn in_memory(config: WardConfig) -> Result<Self> {
        let backend = MemoryBackend::from_config(&config);
        Self::new(backend, config)
    }
}

impl<B: AclBackend> AclService<B> {
    /// Service over `backend` using the basic permission map
    ///
    /// `backend` is used as given; its table names are not taken from
    /// `config.tables`.
    pub fn new(backend: B, config: WardConfig) -> Result<Self> {
        config.validate()?;
        let provider = Arc::new(WardAclProvider::new(backend, &config));
        Ok(Self::from_parts(
            provider,
            Arc::new(BasicPermissionMap::new()),
            AclEvaluator::default(),
            config,
        ))
    }

    /// Service assembled from existing parts
    pub fn from_parts(
        provider: Arc<WardAclProvider<B>>,
        permission_map: Arc<dyn PermissionMap>,
        evaluator: AclEvaluator,
        config: WardConfig,
    ) -> Self {
        Self {
            provider,
            permission_map,
            evaluator,
            config,
        }
    }

    /// Underlying provider
    pub fn provider(&self) -> &Arc<WardAclProvider<B>> {
        &self.provider
    }

    /// Configuration the service was built with
    pub fn config(&self) -> &WardConfig {
        &self.config
    }

    /// Voter sharing this service's provider, map and engine
    pub fn voter(&self) -> AclVoter<WardAclProvider<B>> {
        AclVoter::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.permission_map),
            self.evaluator.clone(),
            &self.config.voter,
        )
    }

    /// Create the backend tables
    pub fn init(&self) -> Result<Vec<String>> {
        let created = self.provider.init_schema()?;
        tracing::info!(tables = created.len(), "ACL schema initialized");
        Ok(created)
    }

    /// Whether `permission` is granted on `object_identity` to `identities`
    ///
    /// Fails with `UnknownPermission`, `AclNotFound` or `NoMatchingEntry`.
    pub fn is_granted(
        &self,
        object_identity: &ObjectIdentity,
        permission: &str,
        identities: &[SecurityIdentity],
    ) -> Result<bool> {
        let masks = self.permission_map.masks(permission)?;
        let acl = self.provider.find_acl(object_identity, identities)?;
        self.evaluator.is_granted(&acl, &masks, identities)
    }

    /// Grant `permission` to `identity`, creating the ACL when missing
    ///
    /// The entry is inserted at index 0 so it shadows older entries.
    pub fn grant(
        &self,
        object_identity: &ObjectIdentity,
        permission: &str,
        identity: SecurityIdentity,
        scope: Scope,
    ) -> Result<()> {
        let mask = MaskBuilder::mask_for(permission)?;
        let acl = self.find_or_create(object_identity)?;
        acl.insert_entry(scope, 0, Entry::grant(identity, mask))?;
        self.provider.update_acl(&acl)
    }

    /// Remove `permission` from the granting entries of `identity`
    ///
    /// Returns the number of entries touched; entries left without any
    /// permission are deleted.
    pub fn revoke(
        &self,
        object_identity: &ObjectIdentity,
        permission: &str,
        identity: &SecurityIdentity,
        scope: Scope,
    ) -> Result<usize> {
        let mask = MaskBuilder::mask_for(permission)?;
        let acl = self.provider.find_acl(object_identity, &[])?;
        let touched = acl.revoke(scope, identity, mask);
        if touched > 0 {
            self.provider.update_acl(&acl)?;
        }
        Ok(touched)
    }

    /// Apply a batch grant
    pub fn set_acl(&self, request: &SetAclRequest) -> Result<()> {
        request.validate()?;
        let mask = request.mask()?;
        let scope = request.scope();

        for oid in &request.object_identities {
            let acl = self.find_or_create(oid)?;
            for identity in &request.security_identities {
                acl.insert_entry(scope, 0, Entry::grant(identity.clone(), mask))?;
            }
            self.provider.update_acl(&acl)?;
            tracing::info!(
                object_identity = %oid,
                %scope,
                %mask,
                identities = request.security_identities.len(),
                "Permissions granted"
            );
        }
        Ok(())
    }

    fn find_or_create(&self, object_identity: &ObjectIdentity) -> Result<Arc<Acl>> {
        match self.provider.find_acl(object_identity, &[]) {
            Err(err) if err.is_not_found() => match self.provider.create_acl(object_identity) {
                // Created concurrently
                Err(WardError::AclAlreadyExists { .. }) => {
                    self.provider.find_acl(object_identity, &[])
                }
                other => other,
            },
            other => other,
        }
    }
}
