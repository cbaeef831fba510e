//! Error codes for resolver diagnostics.
//!
//! Resolver errors occupy the E4xxx band of the checker's code space
//! (E0xxx lexer, E1xxx parser, E2xxx namer, E4xxx resolver, E7xxx
//! inference). The set is closed: the resolver emits these codes and no
//! others.

use std::fmt;

use rue_core::StrictLevel;

/// Error codes for resolver diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    /// Constant never resolved; stubbed out.
    StubConstant,
    /// Constant referenced through a dynamic (non-constant) scope.
    DynamicConstant,
    /// Constant looked up through a type alias.
    ConstantInTypeAlias,
    /// Type alias whose right-hand side depends on itself.
    RecursiveTypeAlias,
    /// Class alias aliasing itself.
    RecursiveClassAlias,
    /// Constant assignment overwriting a type alias.
    ReassignsTypeAlias,
    /// Type alias declared inside a generic class.
    TypeAliasInGenericClass,
    /// Superclass or mixin that is not a statically known class.
    DynamicSuperclass,
    /// Class that is (transitively) its own ancestor.
    CircularDependency,
    /// Superclass redeclared to a different class.
    RedefinitionOfParents,
    /// Malformed method signature.
    InvalidMethodSignature,
    /// Signature and definition disagree on parameter order.
    BadParameterOrdering,
    /// Consecutive signatures in a file that forbids overloads.
    OverloadNotAllowed,
    /// Signature in a file that declares no strictness sigil.
    SigInFileWithoutSigil,
    /// Abstract method with a body.
    AbstractMethodWithBody,
    /// Abstract method outside an abstract class.
    AbstractMethodOutsideAbstract,
    /// Concrete method inside an interface.
    ConcreteMethodInInterface,
    /// Constant typed with a cast other than `T.let`.
    ConstantAssertType,
    /// Constant with no type annotation in a strict file.
    ConstantMissingTypeAnnotation,
    /// Variable declared at an invalid scope.
    InvalidDeclareVariables,
    /// Variable redeclared with a different type.
    DuplicateVariableDeclaration,
    /// Type member bounds incompatible with the parent's.
    ParentTypeBoundsMismatch,
    /// Type member lower bound above its upper bound.
    InvalidTypeMemberBounds,
    /// Malformed `mixes_in_class_methods` declaration.
    InvalidMixinDeclaration,
    /// Malformed `alias_method` declaration.
    BadAliasMethod,
    /// `T.reveal_type` in a file too lax to honor it.
    RevealTypeInUntypedFile,
    /// Malformed `T.type_alias` call.
    InvalidTypeAlias,
}

impl ErrorCode {
    /// Numeric code string, e.g. `E4001`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::StubConstant => "E4001",
            ErrorCode::DynamicConstant => "E4002",
            ErrorCode::ConstantInTypeAlias => "E4003",
            ErrorCode::RecursiveTypeAlias => "E4004",
            ErrorCode::RecursiveClassAlias => "E4005",
            ErrorCode::ReassignsTypeAlias => "E4006",
            ErrorCode::TypeAliasInGenericClass => "E4007",
            ErrorCode::DynamicSuperclass => "E4008",
            ErrorCode::CircularDependency => "E4009",
            ErrorCode::RedefinitionOfParents => "E4010",
            ErrorCode::InvalidMethodSignature => "E4011",
            ErrorCode::BadParameterOrdering => "E4012",
            ErrorCode::OverloadNotAllowed => "E4013",
            ErrorCode::SigInFileWithoutSigil => "E4014",
            ErrorCode::AbstractMethodWithBody => "E4015",
            ErrorCode::AbstractMethodOutsideAbstract => "E4016",
            ErrorCode::ConcreteMethodInInterface => "E4017",
            ErrorCode::ConstantAssertType => "E4018",
            ErrorCode::ConstantMissingTypeAnnotation => "E4019",
            ErrorCode::InvalidDeclareVariables => "E4020",
            ErrorCode::DuplicateVariableDeclaration => "E4021",
            ErrorCode::ParentTypeBoundsMismatch => "E4022",
            ErrorCode::InvalidTypeMemberBounds => "E4023",
            ErrorCode::InvalidMixinDeclaration => "E4024",
            ErrorCode::BadAliasMethod => "E4025",
            ErrorCode::RevealTypeInUntypedFile => "E4026",
            ErrorCode::InvalidTypeAlias => "E4027",
        }
    }

    /// The minimum file strictness at which this code is reported.
    ///
    /// Most resolver errors only surface once a file opts into `# typed:
    /// true`; annotation requirements only at `# typed: strict`.
    /// `RevealTypeInUntypedFile` inverts the usual direction (it is an error
    /// only in lax files), so it reports everywhere and its call site does
    /// the gating.
    pub fn min_level(&self) -> StrictLevel {
        match self {
            ErrorCode::ConstantMissingTypeAnnotation => StrictLevel::Strict,
            ErrorCode::RevealTypeInUntypedFile => StrictLevel::None,
            _ => StrictLevel::True,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let all = [
            ErrorCode::StubConstant,
            ErrorCode::DynamicConstant,
            ErrorCode::ConstantInTypeAlias,
            ErrorCode::RecursiveTypeAlias,
            ErrorCode::RecursiveClassAlias,
            ErrorCode::ReassignsTypeAlias,
            ErrorCode::TypeAliasInGenericClass,
            ErrorCode::DynamicSuperclass,
            ErrorCode::CircularDependency,
            ErrorCode::RedefinitionOfParents,
            ErrorCode::InvalidMethodSignature,
            ErrorCode::BadParameterOrdering,
            ErrorCode::OverloadNotAllowed,
            ErrorCode::SigInFileWithoutSigil,
            ErrorCode::AbstractMethodWithBody,
            ErrorCode::AbstractMethodOutsideAbstract,
            ErrorCode::ConcreteMethodInInterface,
            ErrorCode::ConstantAssertType,
            ErrorCode::ConstantMissingTypeAnnotation,
            ErrorCode::InvalidDeclareVariables,
            ErrorCode::DuplicateVariableDeclaration,
            ErrorCode::ParentTypeBoundsMismatch,
            ErrorCode::InvalidTypeMemberBounds,
            ErrorCode::InvalidMixinDeclaration,
            ErrorCode::BadAliasMethod,
            ErrorCode::RevealTypeInUntypedFile,
            ErrorCode::InvalidTypeAlias,
        ];
        let mut strings: Vec<&str> = all.iter().map(|c| c.as_str()).collect();
        strings.sort_unstable();
        strings.dedup();
        assert_eq!(strings.len(), all.len());
    }
}
