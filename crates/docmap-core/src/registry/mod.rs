
use crate::{
    config::MapperConfig,
    decode::Decoder,
    encode::Encoder,
    error::{ConfigurationError, MapError, UnsupportedTypeError},
    key::KeyDescriptor,
    mapper::Mapper,
    model::{Shape, TypeDescriptor, spec::TypeSpec},
    traits::{Mapped, TypeRef},
};
use std::{
    any::TypeId,
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tracing::{debug, trace, warn};

///
/// Catalog
///
/// Everything the registry has published. Entries are only ever added;
/// a published descriptor is never replaced.
///

#[derive(Default)]
struct Catalog {
    descriptors: HashMap<TypeId, Arc<TypeDescriptor>>,
    discriminators: HashMap<String, TypeId>,
    failures: HashMap<TypeId, MapError>,
    keys: HashMap<TypeId, Result<Arc<KeyDescriptor>, MapError>>,
}

impl Catalog {
    fn name_of(&self, id: TypeId) -> Option<String> {
        self.descriptors.get(&id).map(|d| d.name().to_string())
    }
}

///
/// Staged
/// A descriptor discovered during a build, not yet published.
///

struct Staged {
    ty: TypeRef,
    name: String,
    discriminator: Option<String>,
    shape: Shape,
}

///
/// Registry
///
/// Builds and caches the metadata closure of every mapped type it is asked
/// about. One registry is created at startup and passed to every encoder,
/// decoder and mapper; there is no process-wide instance.
///
/// Reads take a shared lock. Builds are serialized by a separate build lock
/// so at most one build runs at a time and concurrent callers for the same
/// type observe the first caller's published result.
///
/// A type whose key validation failed is never handed out again: `build`
/// returns the cached key error, and every encode or decode of that type
/// fails with it.
///

pub struct Registry {
    config: MapperConfig,
    catalog: RwLock<Catalog>,
    build_lock: Mutex<()>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MapperConfig::default())
    }

    #[must_use]
    pub fn with_config(config: MapperConfig) -> Self {
        Self {
            config,
            catalog: RwLock::new(Catalog::default()),
            build_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Number of published descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ------------------------------------------------------------------
    // Build
    // ------------------------------------------------------------------

    /// Build (or fetch) the descriptor of `T` and everything reachable from it.
    pub fn build<T: Mapped>(&self) -> Result<Arc<TypeDescriptor>, MapError> {
        self.build_type(TypeRef::of::<T>())
    }

    /// Build (or fetch) the descriptor closure rooted at `root`.
    ///
    /// A failed build is cached against the root type and returned to every
    /// later caller without rebuilding.
    pub fn build_type(&self, root: TypeRef) -> Result<Arc<TypeDescriptor>, MapError> {
        if let Some(found) = self.lookup(root.id()) {
            return found;
        }

        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);

        // another caller may have finished while we waited
        if let Some(found) = self.lookup(root.id()) {
            return found;
        }

        let staged = {
            let catalog = self.read();
            Self::stage(&catalog, root, &self.config.discriminator_field).and_then(|mut staged| {
                Self::assign_discriminators(&catalog, &mut staged)?;
                Self::check_memberships(&catalog, &staged)?;
                Ok(staged)
            })
        };

        let mut catalog = self.write();
        match staged {
            Ok(staged) => {
                let published = staged.len();
                for entry in staged {
                    let id = entry.ty.id();
                    if let Some(discriminator) = &entry.discriminator {
                        catalog.discriminators.insert(discriminator.clone(), id);
                    }
                    let descriptor =
                        TypeDescriptor::new(entry.ty, entry.name, entry.discriminator, entry.shape);
                    catalog.descriptors.insert(id, Arc::new(descriptor));
                }
                debug!(root = %root.short_name(), published, "type closure published");

                catalog
                    .descriptors
                    .get(&root.id())
                    .cloned()
                    .ok_or_else(|| MapError::unregistered(root.type_name()))
            }
            Err(err) => {
                warn!(root = %root.short_name(), error = %err, "type build failed");
                catalog.failures.insert(root.id(), err.clone());

                Err(err)
            }
        }
    }

    // discover the closure, depth first, skipping anything already published
    fn stage(
        catalog: &Catalog,
        root: TypeRef,
        discriminator_field: &str,
    ) -> Result<Vec<Staged>, MapError> {
        let mut staged = Vec::new();
        let mut seen = HashSet::new();
        let mut pending = vec![root];

        while let Some(ty) = pending.pop() {
            if catalog.descriptors.contains_key(&ty.id()) || !seen.insert(ty.id()) {
                continue;
            }
            if let Some(err) = catalog.failures.get(&ty.id()) {
                return Err(err.clone());
            }

            let (name, shape) = match ty.describe() {
                TypeSpec::Mapped { name, shape } => (
                    name.map_or_else(|| ty.short_name(), ToString::to_string),
                    shape,
                ),
                TypeSpec::Unsupported(reason) => {
                    return Err(UnsupportedTypeError {
                        type_name: ty.short_name(),
                        reason,
                    }
                    .into());
                }
            };

            check_key_markers(&name, &shape)?;
            check_reserved_names(&name, &shape, discriminator_field)?;
            trace!(ty = %name, shape = shape.label(), "descriptor staged");

            pending.extend(shape.edges());
            staged.push(Staged {
                ty,
                name,
                discriminator: None,
                shape,
            });
        }

        Ok(staged)
    }

    // tag every member of every staged family
    fn assign_discriminators(catalog: &Catalog, staged: &mut [Staged]) -> Result<(), MapError> {
        let claims: Vec<(String, TypeRef, String)> = staged
            .iter()
            .filter_map(|s| match &s.shape {
                Shape::Family(family) => Some((s.name.clone(), family)),
                _ => None,
            })
            .flat_map(|(family_name, family)| {
                family
                    .members()
                    .iter()
                    .map(move |m| (family_name.clone(), m.type_ref(), m.discriminator().to_string()))
            })
            .collect();

        let mut claimed: HashMap<String, TypeRef> = HashMap::new();

        for (family, member, discriminator) in claims {
            let id = member.id();
            let position = staged.iter().position(|s| s.ty.id() == id);

            let is_record = match position {
                Some(i) => matches!(staged[i].shape, Shape::Record(_)),
                None => catalog
                    .descriptors
                    .get(&id)
                    .is_some_and(|d| d.record().is_some()),
            };
            if !is_record {
                return Err(ConfigurationError::FamilyMemberNotRecord {
                    family,
                    type_name: member.short_name(),
                }
                .into());
            }

            let owner = claimed
                .get(&discriminator)
                .map(TypeRef::id)
                .or_else(|| catalog.discriminators.get(&discriminator).copied());
            if let Some(owner) = owner.filter(|owner| *owner != id) {
                let first = catalog
                    .name_of(owner)
                    .or_else(|| {
                        staged
                            .iter()
                            .find(|s| s.ty.id() == owner)
                            .map(|s| s.name.clone())
                    })
                    .unwrap_or_default();

                return Err(ConfigurationError::DuplicateDiscriminator {
                    discriminator,
                    first,
                    second: member.short_name(),
                }
                .into());
            }
            claimed.insert(discriminator.clone(), member);

            let existing = match position {
                Some(i) => staged[i].discriminator.clone(),
                None => catalog
                    .descriptors
                    .get(&id)
                    .and_then(|d| d.discriminator().map(ToString::to_string)),
            };
            match (position, existing) {
                (_, Some(existing)) if existing == discriminator => {}
                (Some(i), None) => staged[i].discriminator = Some(discriminator),
                (_, existing) => {
                    return Err(ConfigurationError::DiscriminatorConflict {
                        type_name: member.short_name(),
                        existing,
                        requested: discriminator,
                    }
                    .into());
                }
            }
        }

        Ok(())
    }

    // a record that names its family must be listed by that family
    fn check_memberships(catalog: &Catalog, staged: &[Staged]) -> Result<(), MapError> {
        for entry in staged {
            let Shape::Record(record) = &entry.shape else {
                continue;
            };
            let Some(base) = record.family() else {
                continue;
            };

            let listed = match staged.iter().find(|s| s.ty == base) {
                Some(s) => match &s.shape {
                    Shape::Family(family) => family.member(entry.ty).is_some(),
                    _ => false,
                },
                None => catalog
                    .descriptors
                    .get(&base.id())
                    .and_then(|d| d.family())
                    .is_some_and(|family| family.member(entry.ty).is_some()),
            };

            if !listed {
                return Err(ConfigurationError::UndeclaredFamilyMember {
                    family: base.short_name(),
                    type_name: entry.name.clone(),
                }
                .into());
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Resolve
    // ------------------------------------------------------------------

    /// Published descriptor for a type, without building.
    #[must_use]
    pub fn resolve(&self, id: TypeId) -> Option<Arc<TypeDescriptor>> {
        self.read().descriptors.get(&id).cloned()
    }

    /// Published descriptor for `T`, without building.
    #[must_use]
    pub fn describe<T: Mapped>(&self) -> Option<Arc<TypeDescriptor>> {
        self.resolve(TypeId::of::<T>())
    }

    /// Concrete family member published under a discriminator.
    #[must_use]
    pub fn resolve_by_discriminator(&self, discriminator: &str) -> Option<Arc<TypeDescriptor>> {
        let catalog = self.read();
        let id = catalog.discriminators.get(discriminator)?;

        catalog.descriptors.get(id).cloned()
    }

    // ------------------------------------------------------------------
    // Keys
    // ------------------------------------------------------------------

    /// Build `E` and validate its key metadata. Failures are cached and
    /// block every later operation on `E`.
    pub fn describe_key<E: Mapped>(&self) -> Result<Arc<KeyDescriptor>, MapError> {
        let id = TypeId::of::<E>();
        if let Some(found) = self.read().keys.get(&id) {
            return found.clone();
        }

        let entity = self.build::<E>()?;

        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(found) = self.read().keys.get(&id) {
            return found.clone();
        }

        let entity_name = entity.name().to_string();
        let described = KeyDescriptor::describe(entity, self).map(Arc::new);
        match &described {
            Ok(key) => debug!(kind = key.kind(), property = key.property(), "key described"),
            Err(err) => warn!(entity = %entity_name, error = %err, "key validation failed"),
        }
        self.write().keys.insert(id, described.clone());

        described
    }

    // ------------------------------------------------------------------
    // Codecs
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn encoder(&self) -> Encoder<'_> {
        Encoder::new(self)
    }

    #[must_use]
    pub const fn decoder(&self) -> Decoder<'_> {
        Decoder::new(self)
    }

    /// Typed mapper for entity `E`; builds and validates `E` on first use.
    pub fn mapper<E: Mapped>(&self) -> Result<Mapper<'_, E>, MapError> {
        let key = self.describe_key::<E>()?;

        Ok(Mapper::new(self, key))
    }

    // ------------------------------------------------------------------
    // Locks
    // ------------------------------------------------------------------

    fn lookup(&self, id: TypeId) -> Option<Result<Arc<TypeDescriptor>, MapError>> {
        let catalog = self.read();
        if let Some(Err(err)) = catalog.keys.get(&id)
            && blocks_type(err)
        {
            return Some(Err(err.clone()));
        }
        if let Some(descriptor) = catalog.descriptors.get(&id) {
            return Some(Ok(Arc::clone(descriptor)));
        }

        catalog.failures.get(&id).cloned().map(Err)
    }

    fn read(&self) -> RwLockReadGuard<'_, Catalog> {
        self.catalog.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Catalog> {
        self.catalog.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// at most one key marker per record; missing keys are only an error for
// entities and are checked when the key is described
fn check_key_markers(name: &str, shape: &Shape) -> Result<(), ConfigurationError> {
    let Shape::Record(record) = shape else {
        return Ok(());
    };

    let keyed: Vec<String> = record
        .properties()
        .iter()
        .filter(|p| p.is_key())
        .map(|p| p.name().to_string())
        .collect();

    if keyed.len() > 1 {
        return Err(ConfigurationError::MultipleKeys {
            entity: name.to_string(),
            properties: keyed,
        });
    }

    Ok(())
}

// the discriminator field is written and read on every record document, so
// no property may share its name
fn check_reserved_names(
    name: &str,
    shape: &Shape,
    discriminator_field: &str,
) -> Result<(), ConfigurationError> {
    let Shape::Record(record) = shape else {
        return Ok(());
    };

    match record
        .properties()
        .iter()
        .find(|p| p.name() == discriminator_field)
    {
        Some(property) => Err(ConfigurationError::ReservedPropertyName {
            record: name.to_string(),
            property: property.name().to_string(),
        }),
        None => Ok(()),
    }
}

// asking for the key of a non-record says nothing about the type itself
fn blocks_type(err: &MapError) -> bool {
    !matches!(
        err.root_cause(),
        MapError::Configuration(ConfigurationError::NotAnEntity { .. })
    )
}
