//! Tenant identifiers and the registry of configured tenants.
//!
//! Each tenant owns a dedicated PostgreSQL schema whose name equals the
//! tenant id. Because the id ends up inside DDL statements (`CREATE SCHEMA`)
//! it is restricted to a valid unquoted identifier.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::CoreError;

/// HTTP header carrying the tenant id.
pub const TENANT_HEADER: &str = "x-tenant-id";

const TENANT_ID_PATTERN: &str = r"^[a-z][a-z0-9_]{0,62}$";

static TENANT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TENANT_ID_PATTERN).expect("valid regex"));

/// Schemas that belong to PostgreSQL itself or to the shared data set.
const RESERVED_SCHEMAS: &[&str] = &["public", "information_schema"];

/// A validated tenant identifier, doubling as the tenant's schema name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Parse a raw tenant id. Input is trimmed and lower-cased first.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let id = raw.trim().to_ascii_lowercase();

        if !TENANT_ID_RE.is_match(&id) {
            return Err(CoreError::Validation(format!(
                "Invalid tenant id '{raw}': expected a lowercase identifier \
                 (letters, digits, underscore; max 63 chars)"
            )));
        }
        if RESERVED_SCHEMAS.contains(&id.as_str()) || id.starts_with("pg_") {
            return Err(CoreError::Validation(format!(
                "Tenant id '{id}' is reserved"
            )));
        }

        Ok(Self(id))
    }

    /// The schema that holds this tenant's tables.
    pub fn schema(&self) -> &str {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of tenants this deployment serves, plus the one used when a
/// request does not name a tenant.
#[derive(Debug, Clone, Serialize)]
pub struct TenantRegistry {
    tenants: Vec<TenantId>,
    default_tenant: TenantId,
}

impl TenantRegistry {
    /// Build a registry. Duplicates are dropped, order is preserved.
    ///
    /// `default_tenant` falls back to the first tenant and must be one of
    /// the registered tenants.
    pub fn new(tenants: Vec<TenantId>, default_tenant: Option<TenantId>) -> Result<Self, CoreError> {
        let mut unique: Vec<TenantId> = Vec::with_capacity(tenants.len());
        for tenant in tenants {
            if !unique.contains(&tenant) {
                unique.push(tenant);
            }
        }

        let default_tenant = match default_tenant {
            Some(t) => t,
            None => unique
                .first()
                .cloned()
                .ok_or_else(|| CoreError::Validation("At least one tenant is required".into()))?,
        };

        if !unique.contains(&default_tenant) {
            return Err(CoreError::Validation(format!(
                "Default tenant '{default_tenant}' is not in the tenant list"
            )));
        }

        Ok(Self {
            tenants: unique,
            default_tenant,
        })
    }

    /// Parse a comma-separated tenant list such as `korean,english`.
    pub fn from_list(list: &str, default_tenant: Option<&str>) -> Result<Self, CoreError> {
        let tenants = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(TenantId::parse)
            .collect::<Result<Vec<_>, _>>()?;

        let default_tenant = default_tenant
            .filter(|s| !s.trim().is_empty())
            .map(TenantId::parse)
            .transpose()?;

        Self::new(tenants, default_tenant)
    }

    pub fn tenants(&self) -> &[TenantId] {
        &self.tenants
    }

    pub fn default_tenant(&self) -> &TenantId {
        &self.default_tenant
    }

    /// Resolve the tenant for a request.
    ///
    /// - No header (or a blank one) resolves to the default tenant.
    /// - A malformed id is a validation error.
    /// - A well-formed but unregistered id is not found.
    pub fn resolve(&self, raw: Option<&str>) -> Result<TenantId, CoreError> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(self.default_tenant.clone()),
            Some(raw) => raw,
        };

        let tenant = TenantId::parse(raw)?;
        if self.tenants.contains(&tenant) {
            Ok(tenant)
        } else {
            Err(CoreError::not_found("Tenant", tenant))
        }
    }
}
