//! The transform pass: type-reference resolution and the ordered rule
//! pipeline that turns parsed declarations into emission-ready symbols.

pub mod pipeline;
pub mod resolve;
pub mod rules;

pub use pipeline::{default_rules, transform};
pub use resolve::{resolve, Resolution, ResolutionMap};
pub use rules::{Rule, RuleContext};

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::SourceLoc;

/// Two symbols mapped to the same final identifier.
///
/// Always fatal: the transform never silently picks one.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum CollisionError {
    #[error(
        "name collision: `{identifier}` is produced by both {first_kind} `{first_name}` \
         ({first_loc}) and {second_kind} `{second_name}` ({second_loc})"
    )]
    #[diagnostic(
        code(gangway::transform::collision),
        help("Rename one of the source declarations or adjust the rule configuration")
    )]
    TopLevel {
        identifier: String,
        first_kind: &'static str,
        first_name: String,
        first_loc: SourceLoc,
        second_kind: &'static str,
        second_name: String,
        second_loc: SourceLoc,
    },

    #[error(
        "name collision in enum `{enum_name}`: members `{first_name}` and `{second_name}` \
         ({loc}) both map to `{identifier}`"
    )]
    #[diagnostic(code(gangway::transform::member_collision))]
    EnumMember {
        enum_name: String,
        identifier: String,
        first_name: String,
        second_name: String,
        loc: SourceLoc,
    },
}
