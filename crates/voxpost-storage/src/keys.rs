//! Shared key generation for storage backends.

use uuid::Uuid;

/// Generate the storage key for a recording's media file.
///
/// Layout: `users/{user_id}/recordings/{recording_id}.{ext}`. All backends
/// and all callers must use this format so the sweeper can always resolve a
/// lifecycle row's `file_path` back to a physical object.
pub fn recording_key(user_id: Uuid, recording_id: Uuid, extension: &str) -> String {
    format!(
        "users/{}/recordings/{}.{}",
        user_id,
        recording_id,
        extension.trim_start_matches('.')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_key_layout() {
        let user = Uuid::nil();
        let rec = Uuid::nil();
        assert_eq!(
            recording_key(user, rec, "mp3"),
            format!("users/{user}/recordings/{rec}.mp3")
        );
        // leading dot tolerated
        assert_eq!(
            recording_key(user, rec, ".wav"),
            format!("users/{user}/recordings/{rec}.wav")
        );
    }
}
