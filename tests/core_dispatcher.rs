//! 命令分发流程测试

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use stars_echoes::core::dispatcher::replies;
use stars_echoes::{
    DeviceKey, Dispatcher, EchoError, EquipmentLocation, Intent, LocationStore,
    MemoryLocationStore, Reply, Result,
};

/// 记录写操作次数的存储替身
#[derive(Default)]
struct CountingStore {
    inner: MemoryLocationStore,
    finds: AtomicUsize,
    inserts: AtomicUsize,
    updates: AtomicUsize,
}

#[async_trait]
impl LocationStore for CountingStore {
    async fn find(&self, key: &DeviceKey) -> Result<Option<EquipmentLocation>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find(key).await
    }

    async fn insert(&self, record: &EquipmentLocation) -> Result<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(record).await
    }

    async fn update(&self, record: &EquipmentLocation) -> Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(record).await
    }
}

/// 模拟连接断开的存储
struct BrokenStore;

#[async_trait]
impl LocationStore for BrokenStore {
    async fn find(&self, _key: &DeviceKey) -> Result<Option<EquipmentLocation>> {
        Err(EchoError::Connection("connection refused".to_string()))
    }

    async fn insert(&self, _record: &EquipmentLocation) -> Result<()> {
        Err(EchoError::Connection("connection refused".to_string()))
    }

    async fn update(&self, _record: &EquipmentLocation) -> Result<()> {
        Err(EchoError::Connection("connection refused".to_string()))
    }
}

fn setup() -> (Arc<CountingStore>, Dispatcher) {
    let store = Arc::new(CountingStore::default());
    let dispatcher = Dispatcher::new(store.clone());
    (store, dispatcher)
}

fn texts(replies: &[Reply]) -> Vec<&str> {
    replies.iter().map(Reply::text).collect()
}

#[tokio::test]
async fn test_query_unknown_device() {
    let (store, dispatcher) = setup();

    let replies = dispatcher.handle("cx 5 12").await.unwrap();
    assert_eq!(
        texts(&replies),
        vec![
            "型号：5\n编号：12\n位置：位置未知",
            replies::ADD_HINT,
            replies::THANKS,
        ]
    );
    assert!(store.inner.is_empty());
}

#[tokio::test]
async fn test_query_known_device() {
    let (_store, dispatcher) = setup();
    dispatcher.handle("add loc 5 12 B7").await.unwrap();

    let replies = dispatcher.handle("查询 5-12").await.unwrap();
    assert_eq!(texts(&replies), vec!["型号：5\n编号：12\n位置：B7"]);
}

#[tokio::test]
async fn test_add_on_empty_store() {
    let (store, dispatcher) = setup();

    let replies = dispatcher.handle("add loc 5 12 B7").await.unwrap();
    assert_eq!(texts(&replies), vec!["位置添加成功\n型号：5\n编号：12\n位置：B7"]);
    assert_eq!(store.inserts.load(Ordering::SeqCst), 1);

    let stored = store.inner.find(&DeviceKey::new("5", "12")).await.unwrap().unwrap();
    assert_eq!(stored.location, "B7");
}

#[tokio::test]
async fn test_add_normalizes_location() {
    let (store, dispatcher) = setup();

    let replies = dispatcher.handle("tjwz 8 1 b7").await.unwrap();
    assert_eq!(texts(&replies), vec!["位置添加成功\n型号：8\n编号：1\n位置：B7"]);

    dispatcher.handle("添加位置 8 2 C003").await.unwrap();
    let stored = store.inner.find(&DeviceKey::new("8", "2")).await.unwrap().unwrap();
    assert_eq!(stored.location, "C003");
}

#[tokio::test]
async fn test_repeated_add_keeps_original_location() {
    let (store, dispatcher) = setup();
    dispatcher.handle("add loc 5 12 B7").await.unwrap();

    for _ in 0..3 {
        let replies = dispatcher.handle("add loc 5 12 D4").await.unwrap();
        assert_eq!(
            texts(&replies),
            vec![
                "型号：5\n编号：12\n位置：B7",
                "该设备位置已被注册位于B7",
                replies::UPDATE_HINT,
                replies::THANKS,
            ]
        );
    }

    assert_eq!(store.inner.len(), 1);
    let stored = store.inner.find(&DeviceKey::new("5", "12")).await.unwrap().unwrap();
    assert_eq!(stored.location, "B7");
}

#[tokio::test]
async fn test_update_existing_device() {
    let (store, dispatcher) = setup();
    dispatcher.handle("add loc 5 12 B7").await.unwrap();

    let replies = dispatcher.handle("update location 5 12 c9").await.unwrap();
    assert_eq!(texts(&replies), vec!["位置更新成功\n型号：5\n编号：12\n位置：C9"]);

    let stored = store.inner.find(&DeviceKey::new("5", "12")).await.unwrap().unwrap();
    assert_eq!(stored.location, "C9");

    let replies = dispatcher.handle("cx 5 12").await.unwrap();
    assert_eq!(texts(&replies), vec!["型号：5\n编号：12\n位置：C9"]);
}

#[tokio::test]
async fn test_update_missing_device() {
    let (store, dispatcher) = setup();

    let replies = dispatcher.handle("update location 5 12 c9").await.unwrap();
    assert_eq!(
        texts(&replies),
        vec!["未找到设备 型号：5 编号：12", replies::ADD_FIRST_HINT]
    );
    assert!(store.inner.find(&DeviceKey::new("5", "12")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_malformed_input_skips_store() {
    let (store, dispatcher) = setup();

    let replies = dispatcher.handle("cx 5").await.unwrap();
    assert_eq!(texts(&replies), vec!["您的输入有误，请重新输入。\n该指令应为：指令 型号 编号"]);

    let replies = dispatcher.handle("add loc 5 12").await.unwrap();
    assert_eq!(
        texts(&replies),
        vec!["您的输入有误，请重新输入。\n该指令应为：指令 型号 编号 位置"]
    );

    let expected = replies::malformed(Intent::Update);
    let replies = dispatcher.handle("gxwz 5 12 99").await.unwrap();
    assert_eq!(texts(&replies), vec![expected.as_str()]);

    assert_eq!(store.finds.load(Ordering::SeqCst), 0);
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
    assert_eq!(store.updates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unrecognized_message() {
    let (store, dispatcher) = setup();

    let replies = dispatcher.handle("今天天气不错").await.unwrap();
    assert_eq!(texts(&replies), vec!["命令似乎不正确"]);
    assert_eq!(replies[0], "命令似乎不正确");
    assert_eq!(store.finds.load(Ordering::SeqCst), 0);
    assert!(store.inner.is_empty());
}

#[tokio::test]
async fn test_concurrent_adds_insert_once() {
    let store = Arc::new(MemoryLocationStore::new());
    let dispatcher = Arc::new(Dispatcher::new(store.clone()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.handle(&format!("add loc 5 12 A{}", i)).await })
        })
        .collect();

    let mut added = 0;
    let mut rejected = 0;
    for handle in handles {
        let replies = handle.await.unwrap().unwrap();
        match replies.len() {
            1 => added += 1,
            4 => rejected += 1,
            n => panic!("unexpected reply count {}", n),
        }
    }

    assert_eq!(added, 1);
    assert_eq!(rejected, 7);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_infrastructure_errors_propagate() {
    let dispatcher = Dispatcher::new(Arc::new(BrokenStore));

    let err = dispatcher.handle("cx 5 12").await.unwrap_err();
    assert!(err.is_infrastructure());

    let err = dispatcher.handle("add loc 5 12 B7").await.unwrap_err();
    assert!(matches!(err, EchoError::Connection(_)));

    let err = dispatcher.handle("up loc 5 12 B7").await.unwrap_err();
    assert!(matches!(err, EchoError::Connection(_)));

    // 不访问存储的流程不受影响
    let replies = dispatcher.handle("hello").await.unwrap();
    assert_eq!(replies, vec![Reply::plain(replies::UNRECOGNIZED)]);
}
