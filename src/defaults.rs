/// Records handed to each volunteer under chunked assignment
pub const DEFAULT_BATCH_SIZE: u32 = 40;

/// Volunteers cycled through under round-robin assignment
pub const DEFAULT_VOLUNTEER_COUNT: u32 = 50;

/// Key of the stored record set
pub const STORAGE_KEY: &str = "survey_app_data";

pub const DEFAULT_FORM_BASE_URL: &str = "http://localhost:3000/";

/// Suggested export filename without extension
pub fn export_basename(only_updated: bool) -> &'static str {
    if only_updated {
        "updated_user_records"
    } else {
        "survey_records"
    }
}
