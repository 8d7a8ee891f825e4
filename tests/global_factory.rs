//! The process-wide factory.
//!
//! The global is shared by everything in this binary, so the whole lifecycle
//! runs in one test.

use std::ptr;

use beanmap::Bean;
use beanmap::mongodb::MongoFactory;
use beanmap::schema::BeanmapConfig;
use futures::future::join_all;

#[derive(Debug, Default, Bean)]
#[bean(collection = "sessions")]
pub struct Session {
    #[bean(id)]
    pub id: String,
    pub user: String,
}

fn config(database: &str) -> BeanmapConfig {
    BeanmapConfig::from_str(&format!(
        r#"
        [scan]
        packages = ["global_factory"]

        [[connections]]
        name = "main"
        uri = "mongodb://localhost:27017"
        database = "{}"
        "#,
        database
    ))
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_global_factory_lifecycle() {
    assert!(MongoFactory::global().is_none());

    // no connections: initialization fails and leaves the global unset
    let err = MongoFactory::init_global(BeanmapConfig::default())
        .await
        .unwrap_err();
    assert!(err.is_config_error());
    assert!(MongoFactory::global().is_none());

    let handles: Vec<_> = (0..8)
        .map(|_| tokio::spawn(MongoFactory::init_global(config("app"))))
        .collect();
    let factories: Vec<&'static MongoFactory> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let first = factories[0];
    assert!(factories.iter().all(|factory| ptr::eq(*factory, first)));
    assert!(ptr::eq(MongoFactory::global().unwrap(), first));
    assert_eq!(first.db().database().name(), "app");
    assert!(first.registry().contains::<Session>());

    // later calls return the existing factory and ignore their config
    let again = MongoFactory::init_global(config("other")).await.unwrap();
    assert!(ptr::eq(again, first));
    assert_eq!(again.db().database().name(), "app");
}
