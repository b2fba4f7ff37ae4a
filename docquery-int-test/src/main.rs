use docquery::collection::{FindOptions, UpdateOptions};
use docquery::errors::QueryResult;
use docquery_derive::{Convertible, Model};
use docquery_int_test::test_util::{cleanup, create_test_context};

#[derive(Debug, Clone, Default, PartialEq, Convertible, Model)]
pub struct StressRecord {
    pub first_name: Option<String>,
    pub processed: Option<bool>,
    pub last_name: Option<String>,
    pub failed: Option<bool>,
    pub note: Option<String>,
}

fn main() -> QueryResult<()> {
    colog::init();
    println!("Starting stress test...");
    let ctx = create_test_context()?;

    let count = 100_000;
    let records = ctx.adapter().querier::<StressRecord>()?;

    let start = std::time::Instant::now();
    for _ in 0..count {
        let record = StressRecord {
            first_name: Some(uuid::Uuid::new_v4().to_string()),
            processed: Some(false),
            last_name: Some(uuid::Uuid::new_v4().to_string()),
            failed: Some(false),
            note: None,
        };
        records.insert_one(&record)?;
    }
    println!("Inserted {} records in {:?}", count, start.elapsed());

    let start = std::time::Instant::now();
    let not_failed = StressRecord {
        failed: Some(false),
        ..Default::default()
    };
    let found = records.find(&not_failed, &FindOptions::new())?;
    println!("Found {} records in {:?}", found.len(), start.elapsed());

    let start = std::time::Instant::now();
    let processed = StressRecord {
        processed: Some(true),
        ..Default::default()
    };
    let result = records.update_many(&StressRecord::default(), &processed, &UpdateOptions::default())?;
    println!("Updated {} records in {:?}", result.modified_count, start.elapsed());

    let start = std::time::Instant::now();
    println!(
        "Counted {} processed records in {:?}",
        records.count_documents(&processed)?,
        start.elapsed()
    );

    cleanup(ctx)
}
