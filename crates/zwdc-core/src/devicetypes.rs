// ── Device-type cache ──
//
// Maps a node's type mapping key to a catalog device-type id. The list of
// integration device types is fetched from the catalog, kept for a bounded
// time, mirrored to the fallback store and replaced wholesale on refresh.
//
// Locking: `state` is a short read/write section that never spans an
// await. `refresh_lock` serializes refreshes across the network fetch, and
// `created` is held for the whole create-and-settle path so that one key
// is never created twice.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use zwdc_api::{AccessTokenSource, CatalogClient, DeviceType, DeviceTypeQuery};

use crate::error::CoreError;
use crate::fallback::FallbackStore;

/// Attribute tagging catalog types owned by this integration.
pub const ATTRIBUTE_USED_FOR_ZWAVE: &str = "senergy/zwave-dc";

/// Attribute holding one or more type mapping keys.
pub const ATTRIBUTE_TYPE_MAPPING_KEY: &str = "senergy/zwave-type-mapping-key";

/// Fallback store key for the last known type list.
pub const FALLBACK_KEY: &str = "device-types";

/// Timing and paging policy for [`DeviceTypeCache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// A fallback-sourced list is retried once older than this, and a
    /// resolve miss forces a refresh past this age.
    pub min_cache_duration: Duration,
    /// Even a healthy list is refreshed once older than this.
    pub max_cache_duration: Duration,
    /// Catalog page size; `0` fetches everything in one request.
    pub page_size: usize,
    /// Pause after a successful create so the catalog can index the type.
    pub creation_settle_delay: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            min_cache_duration: Duration::from_secs(60),
            max_cache_duration: Duration::from_secs(60 * 60),
            page_size: 1000,
            creation_settle_delay: Duration::from_secs(1),
        }
    }
}

/// A successful catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogMatch {
    pub type_id: String,
    /// The list searched came from the fallback store.
    pub used_fallback: bool,
}

#[derive(Default)]
struct CacheState {
    types: Arc<Vec<DeviceType>>,
    last_refresh: Option<Instant>,
    used_fallback: bool,
    invalidated: bool,
}

impl CacheState {
    fn age(&self, now: Instant) -> Option<Duration> {
        self.last_refresh.map(|t| now.saturating_duration_since(t))
    }

    fn is_stale(&self, config: &CacheConfig, now: Instant) -> bool {
        if self.invalidated {
            return true;
        }
        match self.age(now) {
            None => true,
            Some(age) => {
                (self.used_fallback && age > config.min_cache_duration)
                    || age > config.max_cache_duration
            }
        }
    }
}

/// Cached, fallback-backed view of the catalog's integration device types.
pub struct DeviceTypeCache {
    catalog: CatalogClient,
    auth: Arc<dyn AccessTokenSource>,
    fallback: FallbackStore,
    config: CacheConfig,
    state: RwLock<CacheState>,
    refresh_lock: Mutex<()>,
    created: Mutex<HashMap<String, DeviceType>>,
}

impl DeviceTypeCache {
    pub fn new(
        catalog: CatalogClient,
        auth: Arc<dyn AccessTokenSource>,
        fallback: FallbackStore,
        config: CacheConfig,
    ) -> Self {
        Self {
            catalog,
            auth,
            fallback,
            config,
            state: RwLock::new(CacheState::default()),
            refresh_lock: Mutex::new(()),
            created: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // ── Readers ──────────────────────────────────────────────────────

    /// The currently held list, without any refresh check.
    pub fn cached_types(&self) -> Arc<Vec<DeviceType>> {
        Arc::clone(&self.read_state().types)
    }

    /// Whether the held list came from the fallback store.
    pub fn used_fallback(&self) -> bool {
        self.read_state().used_fallback
    }

    pub fn last_refresh(&self) -> Option<Instant> {
        self.read_state().last_refresh
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Return the type list, refreshing it first when it is stale.
    pub async fn list_types(&self) -> Result<Arc<Vec<DeviceType>>, CoreError> {
        let stale = self.read_state().is_stale(&self.config, Instant::now());
        if stale {
            self.refresh_if(|state| state.is_stale(&self.config, Instant::now()))
                .await?;
        }
        Ok(self.cached_types())
    }

    /// Find the catalog type carrying `key` as a type mapping key.
    ///
    /// A miss on a list older than the minimum cache duration triggers one
    /// refresh and a second lookup. A miss after that is
    /// [`CoreError::NoMatchingDeviceType`].
    pub async fn resolve(&self, key: &str) -> Result<CatalogMatch, CoreError> {
        let types = self.list_types().await?;
        if let Some(found) = find_matching_type(&types, key) {
            return Ok(self.matched(found));
        }

        let (observed, age) = {
            let state = self.read_state();
            (state.last_refresh, state.age(Instant::now()))
        };
        if age.is_none_or(|age| age > self.config.min_cache_duration) {
            debug!(key, "no matching device type in cache, refreshing");
            self.refresh_if(|state| state.last_refresh == observed || state.invalidated)
                .await?;
            let types = self.cached_types();
            if let Some(found) = find_matching_type(&types, key) {
                return Ok(self.matched(found));
            }
        }

        Err(CoreError::NoMatchingDeviceType {
            key: key.to_owned(),
            used_fallback: self.used_fallback(),
        })
    }

    fn matched(&self, device_type: &DeviceType) -> CatalogMatch {
        CatalogMatch {
            type_id: device_type.id.clone(),
            used_fallback: self.used_fallback(),
        }
    }

    /// Create `definition` in the catalog, at most once per `key` for the
    /// lifetime of this cache. Repeated calls return the first result
    /// without touching the network.
    pub async fn create_type(
        &self,
        key: &str,
        definition: &DeviceType,
    ) -> Result<DeviceType, CoreError> {
        let mut created = self.created.lock().await;
        if let Some(existing) = created.get(key) {
            debug!(key, type_id = %existing.id, "device type already created");
            return Ok(existing.clone());
        }

        let token = self.auth.ensure_access().await?;
        let result = self.catalog.create_device_type(&token, definition).await?;
        info!(key, type_id = %result.id, name = %result.name, "created device type");

        created.insert(key.to_owned(), result.clone());
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .invalidated = true;

        if !self.config.creation_settle_delay.is_zero() {
            tokio::time::sleep(self.config.creation_settle_delay).await;
        }
        Ok(result)
    }

    /// Unconditionally reload the list from the catalog (or the fallback
    /// store if the catalog is unreachable).
    pub async fn refresh(&self) -> Result<(), CoreError> {
        self.refresh_if(|_| true).await
    }

    /// Refresh under the refresh lock, unless `still_needed` says a
    /// concurrent caller already did the work while we waited.
    async fn refresh_if(
        &self,
        still_needed: impl Fn(&CacheState) -> bool + Send,
    ) -> Result<(), CoreError> {
        let _guard = self.refresh_lock.lock().await;
        if !still_needed(&*self.read_state()) {
            return Ok(());
        }

        match self.fetch_remote().await {
            Ok(types) => {
                info!(count = types.len(), "device-type list refreshed");
                let types = Arc::new(types);
                self.replace(Arc::clone(&types), false);
                if let Err(e) = self.fallback.set(FALLBACK_KEY, types.as_slice()) {
                    warn!(error = %e, "unable to store device types in fallback file");
                }
                Ok(())
            }
            Err(remote) => {
                warn!(error = %remote, "use fallback file to load device type list");
                match self.load_fallback() {
                    Ok(types) => {
                        self.replace(Arc::new(types), true);
                        Ok(())
                    }
                    Err(fallback) => Err(CoreError::Fallback {
                        message: format!("{remote}; fallback unavailable: {fallback}"),
                    }),
                }
            }
        }
    }

    fn replace(&self, types: Arc<Vec<DeviceType>>, used_fallback: bool) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.types = types;
        state.last_refresh = Some(Instant::now());
        state.used_fallback = used_fallback;
        state.invalidated = false;
    }

    async fn fetch_remote(&self) -> Result<Vec<DeviceType>, CoreError> {
        let token = self.auth.ensure_access().await?;
        let query =
            DeviceTypeQuery::with_attribute(ATTRIBUTE_USED_FOR_ZWAVE, self.config.page_size);
        Ok(self.catalog.list_device_types(&token, &query).await?)
    }

    /// Load and re-type the persisted list. If the stored JSON is not in
    /// the canonical shape it is rewritten after a successful decode.
    fn load_fallback(&self) -> Result<Vec<DeviceType>, CoreError> {
        let raw = self.fallback.get(FALLBACK_KEY)?;
        let types: Vec<DeviceType> =
            serde_json::from_value(raw.clone()).map_err(|e| CoreError::Fallback {
                message: format!("fallback file does not contain expected format: {e}"),
            })?;
        if serde_json::to_value(&types).is_ok_and(|normalized| normalized != raw) {
            debug!("normalizing device types in fallback file");
            if let Err(e) = self.fallback.set(FALLBACK_KEY, &types) {
                warn!(error = %e, "unable to rewrite fallback device types");
            }
        }
        Ok(types)
    }
}

/// First type whose mapping-key attribute values contain `key`. Both sides
/// are compared whitespace-trimmed.
pub fn find_matching_type<'a>(types: &'a [DeviceType], key: &str) -> Option<&'a DeviceType> {
    let key = key.trim();
    types.iter().find(|dt| {
        dt.attribute_values(ATTRIBUTE_TYPE_MAPPING_KEY)
            .any(|value| value == key)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use zwdc_api::Attribute;

    fn device_type(id: &str, keys: &[&str]) -> DeviceType {
        let mut attributes = vec![Attribute::new(ATTRIBUTE_USED_FOR_ZWAVE, "true")];
        attributes.extend(
            keys.iter()
                .map(|k| Attribute::new(ATTRIBUTE_TYPE_MAPPING_KEY, *k)),
        );
        DeviceType {
            id: id.into(),
            attributes,
            ..DeviceType::default()
        }
    }

    #[test]
    fn matches_any_trimmed_key() {
        let types = vec![
            device_type("dt-1", &["0x0001.0x0001.0x0001"]),
            device_type("dt-2", &[" 0x0002.0x0005.0x0175 ", "0x0002.0x0005.0x0176"]),
        ];
        assert_eq!(
            find_matching_type(&types, "0x0002.0x0005.0x0175").map(|d| d.id.as_str()),
            Some("dt-2")
        );
        assert_eq!(
            find_matching_type(&types, "0x0002.0x0005.0x0176 ").map(|d| d.id.as_str()),
            Some("dt-2")
        );
        assert!(find_matching_type(&types, "0x0003.0x0000.0x0000").is_none());
    }

    #[test]
    fn other_attributes_do_not_match() {
        let types = vec![DeviceType {
            id: "dt-x".into(),
            attributes: vec![Attribute::new("vendor/key", "0x0002.0x0005.0x0175")],
            ..DeviceType::default()
        }];
        assert!(find_matching_type(&types, "0x0002.0x0005.0x0175").is_none());
    }

    fn state_aged(age: Duration, used_fallback: bool) -> (CacheState, Instant) {
        let now = Instant::now();
        let state = CacheState {
            last_refresh: now.checked_sub(age).or(Some(now)),
            used_fallback,
            ..CacheState::default()
        };
        (state, now)
    }

    fn policy() -> CacheConfig {
        CacheConfig {
            min_cache_duration: Duration::from_secs(60),
            max_cache_duration: Duration::from_secs(600),
            ..CacheConfig::default()
        }
    }

    #[test]
    fn never_refreshed_is_stale() {
        assert!(CacheState::default().is_stale(&policy(), Instant::now()));
    }

    #[test]
    fn healthy_list_between_min_and_max_is_fresh() {
        let (state, now) = state_aged(Duration::from_secs(120), false);
        assert!(!state.is_stale(&policy(), now));
    }

    #[test]
    fn fallback_list_past_min_is_stale() {
        let (state, now) = state_aged(Duration::from_secs(120), true);
        assert!(state.is_stale(&policy(), now));

        let (young, now) = state_aged(Duration::from_secs(10), true);
        assert!(!young.is_stale(&policy(), now));
    }

    #[test]
    fn any_list_past_max_is_stale() {
        let (state, now) = state_aged(Duration::from_secs(700), false);
        assert!(state.is_stale(&policy(), now));
    }

    #[test]
    fn invalidation_forces_refresh() {
        let (mut state, now) = state_aged(Duration::ZERO, false);
        state.invalidated = true;
        assert!(state.is_stale(&policy(), now));
    }
}
