use std::sync::atomic::{AtomicU64, Ordering};

/// Returns a process-unique connection id.
///
/// Ids start at 1 and only grow, so they also order connections by arrival. The id is
/// used as the player id inside a session, which keeps it unique per session as well.
pub fn next_conn_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_ids_are_drawn_then_they_strictly_increase() {
        let a = next_conn_id();
        let b = next_conn_id();

        assert!(a >= 1);
        assert!(b > a);
    }
}
