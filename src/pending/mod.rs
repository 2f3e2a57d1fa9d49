mod patch;
mod payload;
mod store;

pub use patch::Patch;
pub use payload::{
    PayloadOptions, RecordPatch, RecordPatchPayload, SubItemPatch, build_patch_payload,
    sub_object_wire_value,
};
pub use store::PendingEditStore;
