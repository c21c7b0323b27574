mod error;
mod operations;
mod text;
mod types;

pub use error::{procedure_error_to_status_code, ProcedureError};
pub use operations::{
    apply_interaction, matches_search, normalize_related_ids, normalize_tag_names,
    prepare_procedure, sort_procedures, validate_procedure,
};
pub use text::{content_preview, meta_description, reading_time, slugify, strip_tags, unique_slug};
pub use types::{
    AttachmentType, Difficulty, InteractionKind, Procedure, ProcedureAttachment,
    ProcedureCategory, ProcedureImage, ProcedureInteraction, ProcedureStatus, ProcedureTag,
    DEFAULT_TAG_COLOR,
};
