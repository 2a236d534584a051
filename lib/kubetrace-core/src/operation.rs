//! API verbs that pass through an interceptor

use std::fmt;

/// A single intercepted client call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    List,
    Watch,
    Create,
    Update,
    UpdateStatus,
    Patch,
    PatchStatus,
    GetStatus,
    Delete,
    DeleteCollection,
    Apply,
    ApplyStatus,
    GetScale,
    UpdateScale,
    PatchScale,
    ApplyScale,
    Evict,
    GetLogs,
    GetApproval,
    UpdateApproval,
    CreateToken,
    GetEphemeralContainers,
    UpdateEphemeralContainers,
    PatchEphemeralContainers,
    Bind,
    Finalize,
    GetMetadata,
    ListMetadata,
    WatchMetadata,
    PatchMetadata,
}

impl Operation {
    /// Verb name as it appears on spans
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Get => "Get",
            Operation::List => "List",
            Operation::Watch => "Watch",
            Operation::Create => "Create",
            Operation::Update => "Update",
            Operation::UpdateStatus => "UpdateStatus",
            Operation::Patch => "Patch",
            Operation::PatchStatus => "PatchStatus",
            Operation::GetStatus => "GetStatus",
            Operation::Delete => "Delete",
            Operation::DeleteCollection => "DeleteCollection",
            Operation::Apply => "Apply",
            Operation::ApplyStatus => "ApplyStatus",
            Operation::GetScale => "GetScale",
            Operation::UpdateScale => "UpdateScale",
            Operation::PatchScale => "PatchScale",
            Operation::ApplyScale => "ApplyScale",
            Operation::Evict => "Evict",
            Operation::GetLogs => "GetLogs",
            Operation::GetApproval => "GetApproval",
            Operation::UpdateApproval => "UpdateApproval",
            Operation::CreateToken => "CreateToken",
            Operation::GetEphemeralContainers => "GetEphemeralContainers",
            Operation::UpdateEphemeralContainers => "UpdateEphemeralContainers",
            Operation::PatchEphemeralContainers => "PatchEphemeralContainers",
            Operation::Bind => "Bind",
            Operation::Finalize => "Finalize",
            Operation::GetMetadata => "GetMetadata",
            Operation::ListMetadata => "ListMetadata",
            Operation::WatchMetadata => "WatchMetadata",
            Operation::PatchMetadata => "PatchMetadata",
        }
    }

    /// Snake-case label used by metrics
    pub fn metric_label(&self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::List => "list",
            Operation::Watch => "watch",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::UpdateStatus => "update_status",
            Operation::Patch => "patch",
            Operation::PatchStatus => "patch_status",
            Operation::GetStatus => "get_status",
            Operation::Delete => "delete",
            Operation::DeleteCollection => "delete_collection",
            Operation::Apply => "apply",
            Operation::ApplyStatus => "apply_status",
            Operation::GetScale => "get_scale",
            Operation::UpdateScale => "update_scale",
            Operation::PatchScale => "patch_scale",
            Operation::ApplyScale => "apply_scale",
            Operation::Evict => "evict",
            Operation::GetLogs => "get_logs",
            Operation::GetApproval => "get_approval",
            Operation::UpdateApproval => "update_approval",
            Operation::CreateToken => "create_token",
            Operation::GetEphemeralContainers => "get_ephemeral_containers",
            Operation::UpdateEphemeralContainers => "update_ephemeral_containers",
            Operation::PatchEphemeralContainers => "patch_ephemeral_containers",
            Operation::Bind => "bind",
            Operation::Finalize => "finalize",
            Operation::GetMetadata => "get_metadata",
            Operation::ListMetadata => "list_metadata",
            Operation::WatchMetadata => "watch_metadata",
            Operation::PatchMetadata => "patch_metadata",
        }
    }

    /// Whether the verb opens a span.
    ///
    /// Log retrieval is a convenience read that callers stream directly, so it
    /// is forwarded without one.
    pub fn is_traced(&self) -> bool {
        !matches!(self, Operation::GetLogs)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
