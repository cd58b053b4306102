//! Pool standings derived from stored entry points.

use chrono::{DateTime, Utc};
use serde::Serialize;

use quiniela_store::EntryStore;
use quiniela_types::{Entry, EntryId, EntryStatus, PoolId, Result, UserId};

/// One row of a pool's standings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    /// Competition rank: tied entries share a rank and the next rank skips.
    pub rank: usize,
    pub entry_id: EntryId,
    pub user_id: UserId,
    pub user_name: String,
    pub points: u32,
    pub status: EntryStatus,
    pub submitted_at: DateTime<Utc>,
}

/// Rank entries by points, highest first. Ties keep submission order for
/// display but share a rank (1, 2, 2, 4).
#[must_use]
pub fn standings(mut entries: Vec<Entry>) -> Vec<Standing> {
    entries.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(a.submitted_at.cmp(&b.submitted_at))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut rows: Vec<Standing> = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        let rank = match rows.last() {
            Some(prev) if prev.points == entry.points => prev.rank,
            _ => idx + 1,
        };
        rows.push(Standing {
            rank,
            entry_id: entry.id,
            user_id: entry.user_id,
            user_name: entry.user_name,
            points: entry.points,
            status: entry.status,
            submitted_at: entry.submitted_at,
        });
    }
    rows
}

/// Read every entry of a pool and rank them.
pub async fn load_standings<E: EntryStore>(
    store: &E,
    pool_id: PoolId,
    page_size: usize,
) -> Result<Vec<Standing>> {
    let mut entries = Vec::new();
    let mut cursor: Option<EntryId> = None;
    loop {
        let page = store
            .entries_page(pool_id, cursor.as_ref(), page_size.max(1))
            .await?;
        entries.extend(page.entries);
        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    Ok(standings(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiniela_store::MemoryStore;
    use quiniela_types::{Outcome, Pool, Predictions};

    fn entry(pool: &Pool, user: &str, points: u32, minutes: i64) -> Entry {
        let base = DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let predictions: Predictions = pool.fixture_ids().map(|id| (id, Outcome::Draw)).collect();
        let mut e = Entry::new(
            UserId::new(user),
            user.to_uppercase(),
            pool.id,
            &pool.title,
            predictions,
            base + Duration::minutes(minutes),
        );
        e.points = points;
        e
    }

    #[test]
    fn ties_share_rank_and_skip() {
        let pool = Pool::dummy(3);
        let rows = standings(vec![
            entry(&pool, "c", 1, 0),
            entry(&pool, "a", 3, 5),
            entry(&pool, "b", 2, 1),
            entry(&pool, "d", 2, 0),
        ]);
        let summary: Vec<(&str, usize, u32)> = rows
            .iter()
            .map(|r| (r.user_id.as_str(), r.rank, r.points))
            .collect();
        assert_eq!(summary, vec![("a", 1, 3), ("d", 2, 2), ("b", 2, 2), ("c", 4, 1)]);
    }

    #[test]
    fn empty_pool_has_no_standings() {
        assert!(standings(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn load_walks_all_pages() {
        let store = MemoryStore::new();
        let pool = Pool::dummy(2);
        for i in 0..5u32 {
            store
                .create_entry(entry(&pool, &format!("u{i}"), i, i64::from(i)))
                .await
                .unwrap();
        }
        let rows = load_standings(&store, pool.id, 2).await.unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].points, 4);
        assert_eq!(rows[4].rank, 5);
    }
}
