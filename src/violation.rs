//! Contract-violation taxonomy.
//!
//! Every verifier outcome is an explicit result carrying either success or a
//! tagged violation; nothing is retried or recovered internally, and the
//! caller decides whether to panic, log, or collect. Each variant carries the
//! offending type/property/method names so a failure message stands on its
//! own.

/// Result alias used across the engine.
pub type VerifyResult<T = ()> = Result<T, ContractViolation>;

/// An observed deviation from the accessor, immutability, or equality
/// contracts, or a failure of the machinery needed to check them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ContractViolation {
    /// The introspector could not enumerate members of a type.
    #[error("introspection of `{type_name}` failed: {reason}")]
    Introspection { type_name: String, reason: String },

    /// No usable constructor, or instantiation failed.
    #[error("could not construct `{type_name}`: {reason}")]
    Construction { type_name: String, reason: String },

    /// An accessor, setter, or chain method failed when invoked.
    #[error("invoking `{member}` on `{type_name}` failed: {reason}")]
    Invocation {
        type_name: String,
        member: String,
        reason: String,
    },

    /// No companion type matching the configured builder name was found.
    #[error("no builder named `{builder_name}` nested in `{type_name}`")]
    BuilderNotFound {
        type_name: String,
        builder_name: String,
    },

    /// The builder-like type's constructors or method shapes are invalid.
    #[error("builder `{type_name}` is malformed: {reason}")]
    BuilderShape { type_name: String, reason: String },

    /// A property's read accessor did not return what the write accessor was
    /// given.
    #[error(
        "property `{property}` of `{type_name}` failed the accessor round-trip: \
         wrote {written} but read back {read}"
    )]
    AccessorMismatch {
        type_name: String,
        property: String,
        written: String,
        read: String,
    },

    /// A supposedly immutable type exposes a write accessor.
    #[error("`{type_name}` is not immutable: property `{property}` has a write accessor")]
    Mutability { type_name: String, property: String },

    /// A constructed instance's property does not hold its resolved default.
    #[error(
        "property `{property}` of `{type_name}` did not hold its default after \
         construction: expected {expected}, got {actual}"
    )]
    PropertyValueMismatch {
        type_name: String,
        property: String,
        expected: String,
        actual: String,
    },

    /// `equals` and `hashCode` are overridden asymmetrically.
    #[error("asymmetric equals/hashCode override on `{type_name}`: {reason}")]
    EqualsHashCodeMismatch { type_name: String, reason: String },

    /// Generic logical failure of the equals/hashCode contract.
    #[error("equality contract violated on `{type_name}`: {detail}")]
    Equality { type_name: String, detail: String },
}

impl ContractViolation {
    pub(crate) fn introspection(ty: impl ToString, reason: impl ToString) -> Self {
        ContractViolation::Introspection {
            type_name: ty.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn construction(ty: impl ToString, reason: impl ToString) -> Self {
        ContractViolation::Construction {
            type_name: ty.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invocation(ty: impl ToString, member: impl ToString, reason: impl ToString) -> Self {
        ContractViolation::Invocation {
            type_name: ty.to_string(),
            member: member.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn builder_shape(ty: impl ToString, reason: impl ToString) -> Self {
        ContractViolation::BuilderShape {
            type_name: ty.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn equality(ty: impl ToString, detail: impl ToString) -> Self {
        ContractViolation::Equality {
            type_name: ty.to_string(),
            detail: detail.to_string(),
        }
    }
}
