use common::model::record::CurrentRecord;
use common::requests::{ModuleDetail, RecordPage};
use uuid::Uuid;

use crate::api::ApiError;

pub enum Msg {
    DetailLoaded(Result<ModuleDetail, ApiError>),
    PageLoaded(Result<RecordPage, ApiError>),
    ChangePage(u32),
    OpenNew,
    OpenEdit(CurrentRecord),
    CloseForm,
    Saved,
    /// Master record id.
    Delete(Uuid),
    Deleted(Result<(), ApiError>),
    Export,
    Exported(Result<Vec<u8>, ApiError>),
}
