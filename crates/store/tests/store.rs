use canopy_core_types::{TallyId, TreeName, TreeType};
use canopy_store::{Inserted, MemoryStore, RedbStore, TreeRequest, TreeStore};

fn request(tally_id: u64, name: &str, tree_type: &str) -> TreeRequest {
    TreeRequest {
        tally_id: TallyId::new(tally_id),
        name: TreeName::from(name),
        tree_type: TreeType::from(tree_type),
        height: 12.5,
        age: 40,
        latitude: 45.5,
        longitude: -73.6,
    }
}

async fn inserts_and_deduplicates(store: &impl TreeStore) {
    let oak = request(1, "OakA", "Oak");
    let maple = request(2, "MapleB", "Maple");

    assert_eq!(store.insert_tree_request(&oak).await.unwrap(), Inserted::New(1));
    assert_eq!(store.insert_tree_request(&maple).await.unwrap(), Inserted::New(2));

    // Retrying the same tally does not write a second row, even if the winner
    // changed, and hands back what was first written
    let retry = request(1, "OakA", "Maple");
    assert_eq!(
        store.insert_tree_request(&retry).await.unwrap(),
        Inserted::Existing {
            id: 1,
            stored: oak.clone()
        }
    );

    // Same name, later tally
    let again = request(3, "OakA", "Oak");
    assert_eq!(store.insert_tree_request(&again).await.unwrap(), Inserted::New(3));

    let rows = store.list().await.unwrap();
    assert_eq!(rows, vec![(1, oak), (2, maple), (3, again)]);
}

#[tokio::test]
async fn memory_store() {
    let store = MemoryStore::new();
    assert!(store.is_empty().await);

    inserts_and_deduplicates(&store).await;
    assert_eq!(store.len().await, 3);
}

#[tokio::test]
async fn redb_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = RedbStore::open(dir.path().join("requests.redb")).unwrap();

    inserts_and_deduplicates(&store).await;
}

#[tokio::test]
async fn redb_store_survives_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("requests.redb");

    {
        let store = RedbStore::open(&path).unwrap();
        store
            .insert_tree_request(&request(7, "Elm", "Elm"))
            .await
            .unwrap();
    }

    let store = RedbStore::open(&path).unwrap();
    let rows = store.list().await.unwrap();
    assert_eq!(rows, vec![(1, request(7, "Elm", "Elm"))]);

    assert_eq!(
        store
            .insert_tree_request(&request(7, "Elm", "Elm"))
            .await
            .unwrap(),
        Inserted::Existing {
            id: 1,
            stored: request(7, "Elm", "Elm")
        }
    );
}
