use serde::{Deserialize, Serialize};
use std::fmt;

/// A canonical proxied operation, derived from an inbound request's method and path.
///
/// Actions are partitioned into two classes. Zone-scoped actions are granted per zone through a
/// [`Permission`][crate::token_store::Permission]. Administrator-only actions are never granted
/// and require an administrator identity.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ListZones,
    GetZone,
    ListRecords,
    AddRecord,
    UpdateRecord,
    DeleteRecord,
    CreateZone,
    UpdateZone,
    CheckAvailability,
    ImportRecords,
    ExportRecords,
    EnableDnssec,
    DisableDnssec,
    GetStatistics,
    TriggerScan,
    GetScanResult,
    IssueCertificate,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::ListZones => "list_zones",
            Action::GetZone => "get_zone",
            Action::ListRecords => "list_records",
            Action::AddRecord => "add_record",
            Action::UpdateRecord => "update_record",
            Action::DeleteRecord => "delete_record",
            Action::CreateZone => "create_zone",
            Action::UpdateZone => "update_zone",
            Action::CheckAvailability => "check_availability",
            Action::ImportRecords => "import_records",
            Action::ExportRecords => "export_records",
            Action::EnableDnssec => "enable_dnssec",
            Action::DisableDnssec => "disable_dnssec",
            Action::GetStatistics => "get_statistics",
            Action::TriggerScan => "trigger_scan",
            Action::GetScanResult => "get_scan_result",
            Action::IssueCertificate => "issue_certificate",
        }
    }

    /// Administrator-only actions can't be granted through a permission.
    pub fn is_admin_only(self) -> bool {
        !matches!(
            self,
            Action::ListZones
                | Action::GetZone
                | Action::ListRecords
                | Action::AddRecord
                | Action::UpdateRecord
                | Action::DeleteRecord
        )
    }

    /// Record mutations are additionally gated on the record type being written.
    pub fn is_record_mutation(self) -> bool {
        matches!(self, Action::AddRecord | Action::UpdateRecord)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
