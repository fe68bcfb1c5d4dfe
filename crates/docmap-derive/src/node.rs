use darling::{
    Error as DarlingError, FromDeriveInput, FromField, FromVariant,
    ast::{Data, Fields},
};
use syn::{Generics, Ident, Path, ext::IdentExt};

///
/// MappedInput
///

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(mapped), supports(struct_named, enum_unit, enum_newtype))]
pub struct MappedInput {
    pub ident: Ident,
    pub generics: Generics,
    pub data: Data<MappedVariant, MappedField>,

    /// Registered type name, the Rust identifier when absent.
    #[darling(default)]
    pub name: Option<String>,

    #[darling(default)]
    pub kind: Option<String>,

    #[darling(default)]
    pub member_of: Option<Path>,

    #[darling(default)]
    pub family: Option<String>,
}

impl MappedInput {
    pub fn type_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.ident.unraw().to_string())
    }

    pub fn validate(&self) -> Result<(), DarlingError> {
        if !self.generics.params.is_empty() {
            return Err(
                DarlingError::custom("Mapped cannot be derived for generic types")
                    .with_span(&self.generics),
            );
        }

        match &self.data {
            Data::Struct(fields) => self.validate_record(fields),
            Data::Enum(variants) => self.validate_enum(variants),
        }
    }

    fn validate_record(&self, fields: &Fields<MappedField>) -> Result<(), DarlingError> {
        let mut errors = DarlingError::accumulator();

        if self.family.is_some() {
            errors.push(
                DarlingError::custom("`family` applies to enums with newtype variants")
                    .with_span(&self.ident),
            );
        }

        let mut keys = 0;
        for field in fields.iter() {
            if let Err(err) = field.validate() {
                errors.push(err);
            }

            if field.key {
                keys += 1;
                if keys > 1 {
                    errors.push(
                        DarlingError::custom("only one field can be the key")
                            .with_span(&field.ident),
                    );
                }
            }
        }

        errors.finish()
    }

    fn validate_enum(&self, variants: &[MappedVariant]) -> Result<(), DarlingError> {
        if self.kind.is_some() || self.member_of.is_some() {
            return Err(
                DarlingError::custom("`kind` and `member_of` apply to structs")
                    .with_span(&self.ident),
            );
        }
        if variants.is_empty() {
            return Err(
                DarlingError::custom("Mapped cannot be derived for an enum without variants")
                    .with_span(&self.ident),
            );
        }

        let units = variants.iter().filter(|v| v.fields.is_unit()).count();
        if units == 0 {
            return Ok(());
        }
        if units != variants.len() {
            return Err(DarlingError::custom(
                "variants must be all unit (an enumeration) or all newtype (a family)",
            )
            .with_span(&self.ident));
        }

        if self.family.is_some() {
            return Err(
                DarlingError::custom("`family` applies to enums with newtype variants")
                    .with_span(&self.ident),
            );
        }
        match variants.iter().find(|v| v.tag.is_some()) {
            Some(variant) => Err(DarlingError::custom("`tag` applies to newtype variants")
                .with_span(&variant.ident)),
            None => Ok(()),
        }
    }

    /// Fieldless enums map to ordinals; every other enum is a family.
    pub fn is_enumeration(&self) -> bool {
        match &self.data {
            Data::Enum(variants) => variants.iter().all(|v| v.fields.is_unit()),
            Data::Struct(_) => false,
        }
    }
}

///
/// MappedField
///

#[derive(Debug, FromField)]
#[darling(attributes(mapped))]
pub struct MappedField {
    pub ident: Option<Ident>,

    #[darling(default)]
    pub key: bool,

    /// The store assigns the identity on insert.
    #[darling(default)]
    pub auto: bool,

    #[darling(default)]
    pub rename: Option<String>,

    #[darling(default)]
    pub unindexed: bool,

    /// Left out of the document; decoding leaves the field at its default.
    #[darling(default)]
    pub skip: bool,
}

impl MappedField {
    pub fn property_name(&self, ident: &Ident) -> String {
        self.rename
            .clone()
            .unwrap_or_else(|| ident.unraw().to_string())
    }

    fn validate(&self) -> Result<(), DarlingError> {
        if self.auto && !self.key {
            return Err(DarlingError::custom("`auto` requires `key`").with_span(&self.ident));
        }
        if self.skip && (self.key || self.unindexed || self.rename.is_some()) {
            return Err(
                DarlingError::custom("a skipped field takes no other options")
                    .with_span(&self.ident),
            );
        }
        if self.key && self.unindexed {
            return Err(
                DarlingError::custom("the key is never stored as a property")
                    .with_span(&self.ident),
            );
        }

        Ok(())
    }
}

///
/// MappedVariant
///

#[derive(Debug, FromVariant)]
#[darling(attributes(mapped))]
pub struct MappedVariant {
    pub ident: Ident,
    pub fields: Fields<()>,

    /// Member tag within the family, the variant name when absent.
    #[darling(default)]
    pub tag: Option<String>,
}

impl MappedVariant {
    pub fn tag(&self) -> String {
        self.tag
            .clone()
            .unwrap_or_else(|| self.ident.unraw().to_string())
    }
}
