//! Service context - shared handles every service borrows

use bot_cache::EntityCache;
use bot_rest::RestClient;
use std::sync::Arc;

use super::permission::PermissionResolver;

/// Cache and REST client shared by the command services
#[derive(Clone)]
pub struct ServiceContext {
    cache: Arc<EntityCache>,
    rest: Arc<RestClient>,
    permissions: PermissionResolver,
}

impl ServiceContext {
    pub fn new(cache: Arc<EntityCache>, rest: Arc<RestClient>) -> Self {
        let permissions = PermissionResolver::new(Arc::clone(&cache));
        Self {
            cache,
            rest,
            permissions,
        }
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn permissions(&self) -> &PermissionResolver {
        &self.permissions
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("cache", &"EntityCache")
            .field("rest", &self.rest)
            .finish()
    }
}
