use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

pub const PUBLIC_ID_PREFIX: &str = "processed";

/// Drops the final `.ext` from a file name. Only a suffix without `.` or `/`
/// counts as an extension, so `my.image.name.png` becomes `my.image.name`.
pub fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(dot) => {
            let extension = &file_name[dot + 1..];
            if extension.is_empty() || extension.contains('/') {
                file_name
            } else {
                &file_name[..dot]
            }
        }
        None => file_name,
    }
}

/// Hands out `processed_<millis>_<stem>` ids. The millisecond component never
/// repeats or goes backwards for a given generator, even within one millisecond.
#[derive(Debug, Default)]
pub struct PublicIdGenerator {
    last_millis: AtomicI64,
}

impl PublicIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(&self, file_name: &str) -> String {
        let millis = self.next_millis(Utc::now().timestamp_millis());
        format!("{PUBLIC_ID_PREFIX}_{millis}_{}", strip_extension(file_name))
    }

    fn next_millis(&self, now: i64) -> i64 {
        let previous = self
            .last_millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }
}
