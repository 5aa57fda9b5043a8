//! Tests against a live PostgreSQL. They read `DATABASE_URL` (also from `.env`) and skip
//! when it is not set.

use chrono::{DateTime, Utc};
use pgsq::{
    Config, Database, Decimal, Model, Op, OrmError, OrmResult, Param, Qb, Relation, SqlLog,
    Table, TxOutcome, TxState, set,
};

fn database(test: &str) -> Option<Database> {
    dotenvy::dotenv().ok();
    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = pgsq::create_pool_with_config(&url, 4).ok()?;
            Some(Database::new(pool, Config::new().sql_log(SqlLog::new())))
        }
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping {test}");
            None
        }
    }
}

async fn reset(db: &Database, ddl: &[&str]) -> OrmResult<()> {
    for statement in ddl {
        db.exec(statement, &[]).await?;
    }
    Ok(())
}

// ─── CRUD ───────────────────────────────────────────────────────────────────

#[derive(Table)]
#[sq(table = "pgsq_it_member", soft_delete, timestamps)]
struct TableMember;

#[derive(Debug, Clone, PartialEq, Model)]
#[sq(table_of = TableMember)]
struct Member {
    #[sq(pk)]
    id: String,
    name: String,
    age: i32,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

fn member(id: &str, name: &str, age: i32) -> Member {
    Member {
        id: id.into(),
        name: name.into(),
        age,
        created_at: None,
        updated_at: None,
    }
}

#[tokio::test]
async fn crud_with_soft_delete() -> OrmResult<()> {
    let Some(db) = database("crud_with_soft_delete") else {
        return Ok(());
    };
    reset(
        &db,
        &[
            "DROP TABLE IF EXISTS pgsq_it_member",
            "CREATE TABLE pgsq_it_member (
                 id TEXT PRIMARY KEY,
                 name TEXT NOT NULL,
                 age INT4 NOT NULL,
                 created_at TIMESTAMPTZ,
                 updated_at TIMESTAMPTZ,
                 deleted_at TIMESTAMPTZ
             )",
        ],
    )
    .await?;

    let stored = db.insert_model(&member("m1", "A", 18)).await?;
    let created = stored.created_at.expect("created_at is set on insert");
    assert!((Utc::now() - created).num_seconds().abs() < 5);
    assert_eq!(stored.created_at, stored.updated_at);

    let fetched: Option<Member> = db
        .query_one(Qb::table::<TableMember>().and("id", Op::equal("m1")))
        .await?;
    assert_eq!(fetched.as_ref(), Some(&stored));
    assert_eq!((stored.id.as_str(), stored.name.as_str(), stored.age), ("m1", "A", 18));

    let inserted = db
        .insert(
            Qb::table::<TableMember>()
                .value("id", "m2")
                .value("name", "B")
                .value("age", 20),
        )
        .await?;
    assert_eq!(inserted, 1);

    let found: Option<Member> = db
        .query_one(Qb::table::<TableMember>().and("name", Op::equal("A")))
        .await?;
    assert_eq!(found.map(|m| m.id).as_deref(), Some("m1"));

    let missing: Option<Member> = db
        .query_one(Qb::table::<TableMember>().and("name", Op::equal("nobody")))
        .await?;
    assert!(missing.is_none());

    // Columns outside an explicit projection keep their defaults.
    let partial: Option<Member> = db
        .query_one(
            Qb::table::<TableMember>()
                .select(["name"])
                .and("name", Op::like_left("A")),
        )
        .await?;
    assert_eq!(partial, Some(member("", "A", 0)));

    assert_eq!(db.count(Qb::table::<TableMember>()).await?, 2);
    assert_eq!(
        db.sum::<i64>("age", Qb::table::<TableMember>()).await?,
        Some(38)
    );
    assert_eq!(
        db.sum::<i64>("age", Qb::table::<TableMember>().and("age", Op::gt(100)))
            .await?,
        None
    );

    let updated = db
        .update(
            Qb::table::<TableMember>()
                .set("age", 21)
                .and("id", Op::equal("m2")),
        )
        .await?;
    assert_eq!(updated, 1);
    db.update_model(&stored, [set("name", "A2")]).await?;

    let row: Option<(String, i32)> = db
        .query_row(
            Qb::table::<TableMember>()
                .select(["name", "age"])
                .and("id", Op::equal("m2")),
        )
        .await?;
    assert_eq!(row, Some(("B".to_string(), 21)));

    // Empty predicates never reach the server.
    let err = db.hard_delete(Qb::table::<TableMember>()).await.unwrap_err();
    assert!(err.is_missing_where());
    assert_eq!(db.count(Qb::table::<TableMember>()).await?, 2);

    // Soft-deleted rows disappear from reads but not from the table.
    assert_eq!(db.soft_delete_model(&stored).await?, 1);
    assert_eq!(db.count(Qb::table::<TableMember>()).await?, 1);
    assert_eq!(
        db.count(Qb::table::<TableMember>().disable_soft_delete())
            .await?,
        2
    );
    assert!(
        db.has(Qb::table::<TableMember>().and("id", Op::equal("m1")).disable_soft_delete())
            .await?
    );
    // A second soft delete matches nothing.
    assert_eq!(db.soft_delete_model(&stored).await?, 0);

    let mut names = Vec::new();
    db.query_each(
        Qb::table::<TableMember>()
            .select(["name"])
            .disable_soft_delete()
            .asc("name"),
        |row| {
            names.push(row.try_get::<_, String>(0).map_err(OrmError::from_db_error)?);
            Ok(())
        },
    )
    .await?;
    assert_eq!(names, ["A2", "B"]);

    let removed = db
        .hard_delete(Qb::table::<TableMember>().and("id", Op::in_list(["m1", "m2"])))
        .await?;
    assert_eq!(removed, 2);
    assert!(!db.has(Qb::table::<TableMember>().disable_soft_delete()).await?);
    Ok(())
}

// ─── Transactions ───────────────────────────────────────────────────────────

#[derive(Table)]
#[sq(table = "pgsq_it_ledger")]
struct TableLedger;

fn entry(id: i64) -> Qb {
    Qb::table::<TableLedger>().value("id", id).value("amount", 10_i64)
}

#[tokio::test]
async fn transaction_outcomes() -> OrmResult<()> {
    let Some(db) = database("transaction_outcomes") else {
        return Ok(());
    };
    reset(
        &db,
        &[
            "DROP TABLE IF EXISTS pgsq_it_ledger",
            "CREATE TABLE pgsq_it_ledger (id INT8 PRIMARY KEY, amount INT8 NOT NULL)",
        ],
    )
    .await?;

    let report = db
        .transaction(|tx| {
            Box::pin(async move {
                tx.insert(entry(1)).await?;
                tx.exec(
                    "UPDATE pgsq_it_ledger SET amount = amount + $1 WHERE id = $2",
                    &[Param::new(5_i64), Param::new(1_i64)],
                )
                .await?;
                Ok::<_, OrmError>(TxOutcome::Commit)
            })
        })
        .await;
    assert!(!report.rolled_back());
    assert_eq!(report.into_result()?, TxState::Committed);

    let report = db
        .transaction(|tx| {
            Box::pin(async move {
                tx.insert(entry(2)).await?;
                Ok::<_, OrmError>(TxOutcome::Rollback)
            })
        })
        .await;
    assert!(report.rolled_back());
    assert!(report.error.is_none());

    let report = db
        .transaction(|tx| {
            Box::pin(async move {
                tx.insert(entry(3)).await?;
                Ok::<_, OrmError>(TxOutcome::RollbackWithError(OrmError::other("custom error")))
            })
        })
        .await;
    assert!(report.rolled_back());
    assert_eq!(report.error.map(|e| e.to_string()).as_deref(), Some("custom error"));

    // The duplicate key error propagates with `?` and is reported as the cause.
    let report = db
        .transaction(|tx| {
            Box::pin(async move {
                tx.insert(entry(4)).await?;
                tx.insert(entry(1)).await?;
                Ok::<_, OrmError>(TxOutcome::Commit)
            })
        })
        .await;
    assert!(report.rolled_back());
    assert!(report.error.as_ref().is_some_and(OrmError::is_unique_violation));

    // Swallowing the failure does not let the transaction commit.
    let report = db
        .transaction(|tx| {
            Box::pin(async move {
                tx.insert(entry(5)).await?;
                let _ = tx.insert(entry(1)).await;
                Ok::<_, OrmError>(TxOutcome::Commit)
            })
        })
        .await;
    assert!(report.rolled_back());
    assert!(matches!(report.error, Some(OrmError::Transaction(_))));

    let report = db
        .transaction(|tx| {
            Box::pin(async move {
                tx.insert(entry(6)).await?;
                let visible = tx.count(Qb::table::<TableLedger>()).await?;
                assert!(visible == 0, "boom: {visible} rows visible");
                Ok::<_, OrmError>(TxOutcome::Commit)
            })
        })
        .await;
    assert!(report.rolled_back());
    assert!(report.error.is_some_and(|e| e.to_string().contains("boom")));

    assert_eq!(db.count(Qb::table::<TableLedger>()).await?, 1);
    assert_eq!(
        db.sum::<Decimal>("amount", Qb::table::<TableLedger>()).await?,
        Some(Decimal::from(15))
    );
    Ok(())
}

// ─── Aggregates ─────────────────────────────────────────────────────────────

#[derive(Table)]
#[sq(table = "pgsq_it_amount")]
struct TableAmount;

#[tokio::test]
async fn sum_decodes_every_numeric_width() -> OrmResult<()> {
    let Some(db) = database("sum_decodes_every_numeric_width") else {
        return Ok(());
    };
    reset(
        &db,
        &[
            "DROP TABLE IF EXISTS pgsq_it_amount",
            "CREATE TABLE pgsq_it_amount (
                 id INT8 PRIMARY KEY,
                 amount INT8 NOT NULL,
                 price NUMERIC(10, 2) NOT NULL,
                 small INT4 NOT NULL
             )",
        ],
    )
    .await?;

    for (id, amount, price, small) in [(1_i64, 30_i64, 150_i64, 5_i32), (2, -30, 225, -5)] {
        db.insert(
            Qb::table::<TableAmount>()
                .value("id", id)
                .value("amount", amount)
                .value("price", Decimal::new(price, 2))
                .value("small", small),
        )
        .await?;
    }

    let all = || Qb::table::<TableAmount>();
    // Rows summing to zero are not the same as no rows.
    assert_eq!(db.sum::<Decimal>("amount", all()).await?, Some(Decimal::ZERO));
    assert_eq!(db.sum::<i64>("small", all()).await?, Some(0));
    assert_eq!(db.sum::<Decimal>("price", all()).await?, Some(Decimal::new(375, 2)));
    assert_eq!(
        db.sum::<Decimal>("amount", all().and("id", Op::gt(10_i64)))
            .await?,
        None
    );
    Ok(())
}

// ─── Relations ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Model)]
#[sq(table = "pgsq_it_owner", soft_delete)]
struct Owner {
    #[sq(pk)]
    id: String,
    name: String,
}

#[derive(Debug, Clone, Model)]
#[sq(table = "pgsq_it_pet")]
struct Pet {
    #[sq(pk, generated)]
    id: i64,
    owner_id: String,
    name: String,
}

#[derive(Debug)]
struct OwnerWithPet {
    owner: Owner,
    pet: Option<Pet>,
}

impl Relation for OwnerWithPet {
    type Main = Owner;
    type Join = Pet;

    fn on() -> (&'static str, &'static str) {
        ("id", "owner_id")
    }

    fn compose(owner: Owner, pet: Option<Pet>) -> Self {
        Self { owner, pet }
    }
}

#[tokio::test]
async fn relation_left_join() -> OrmResult<()> {
    let Some(db) = database("relation_left_join") else {
        return Ok(());
    };
    reset(
        &db,
        &[
            "DROP TABLE IF EXISTS pgsq_it_pet",
            "DROP TABLE IF EXISTS pgsq_it_owner",
            "CREATE TABLE pgsq_it_owner (id TEXT PRIMARY KEY, name TEXT NOT NULL, deleted_at TIMESTAMPTZ)",
            "CREATE TABLE pgsq_it_pet (id INT8 GENERATED ALWAYS AS IDENTITY PRIMARY KEY, owner_id TEXT NOT NULL, name TEXT NOT NULL)",
        ],
    )
    .await?;

    for (id, name) in [("o1", "Ann"), ("o2", "Bob")] {
        db.insert_model(&Owner {
            id: id.into(),
            name: name.into(),
        })
        .await?;
    }
    let pet = db
        .insert_model(&Pet {
            id: 0,
            owner_id: "o1".into(),
            name: "Rex".into(),
        })
        .await?;
    assert!(pet.id > 0);

    let all: Vec<OwnerWithPet> = db
        .query_relation_all(
            Qb::new()
                .and("pgsq_it_owner.id", Op::in_list(["o1", "o2"]))
                .asc("pgsq_it_owner.id"),
        )
        .await?;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].owner.name, "Ann");
    assert_eq!(all[0].pet.as_ref().map(|p| p.name.as_str()), Some("Rex"));
    assert_eq!(all[1].owner.name, "Bob");
    assert!(all[1].pet.is_none());

    let one: Option<OwnerWithPet> = db
        .query_relation(Qb::new().and("pgsq_it_owner.id", Op::equal("o2")))
        .await?;
    assert!(one.is_some_and(|r| r.pet.is_none()));
    Ok(())
}
