use chrono::{DateTime, Utc};
use pgsq::{Column, DescribesTable, Dialect, Model, Op, Qb, Relation, Table, render};

#[derive(Table)]
#[sq(table = "user", soft_delete, timestamps)]
struct TableUser;

#[derive(Debug, Clone, Model)]
#[sq(table_of = TableUser)]
struct User {
    #[sq(pk)]
    id: String,
    #[sq(column = "full_name")]
    name: String,
    age: i32,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    #[sq(skip)]
    display: String,
}

#[derive(Debug, Clone, Model)]
#[sq(table = "user_address", soft_delete = "removed_at")]
struct UserAddress {
    #[sq(pk, generated)]
    id: i64,
    user_id: String,
    city: String,
}

#[derive(Table)]
#[sq(table = "audit_log", created_at = "logged_at")]
struct TableAuditLog;

struct UserWithAddress {
    user: User,
    address: Option<UserAddress>,
}

impl Relation for UserWithAddress {
    type Main = User;
    type Join = UserAddress;

    fn on() -> (&'static str, &'static str) {
        ("id", "user_id")
    }

    fn compose(user: User, address: Option<UserAddress>) -> Self {
        Self { user, address }
    }
}

fn alice() -> User {
    User {
        id: "u1".into(),
        name: "Alice".into(),
        age: 30,
        created_at: None,
        updated_at: None,
        display: String::new(),
    }
}

#[test]
fn table_marker_carries_conventions() {
    let table = TableUser::table();
    assert_eq!(table.name, "user");
    assert_eq!(table.soft_delete, Some("deleted_at"));
    assert_eq!(table.created_at, Some("created_at"));
    assert_eq!(table.updated_at, Some("updated_at"));
    assert_eq!(TableUser::TABLE, "user");

    let audit = TableAuditLog::table();
    assert_eq!(audit.created_at, Some("logged_at"));
    assert_eq!(audit.updated_at, None);
    assert_eq!(audit.soft_delete, None);
}

#[test]
fn model_shares_its_table_marker() {
    assert!(std::ptr::eq(User::table(), TableUser::table()));
    assert_eq!(UserAddress::table().soft_delete, Some("removed_at"));
}

#[test]
fn model_columns_follow_field_attributes() {
    let names: Vec<&str> = User::columns().iter().map(|c| c.name).collect();
    assert_eq!(names, ["id", "full_name", "age", "created_at", "updated_at"]);
    assert!(User::columns()[0].primary_key);
    assert!(User::columns()[1..].iter().all(|c| !c.primary_key));

    let id = &UserAddress::columns()[0];
    assert!(id.primary_key);
    assert!(!id.insertable);

    assert_eq!(User::COL_NAME, Column::new("full_name"));
    assert_eq!(UserAddress::COL_USER_ID.as_str(), "user_id");
    assert_eq!(alice().values().len(), User::columns().len());
}

#[test]
fn primary_key_value_comes_from_the_record() {
    let (column, _) = alice().primary_key().unwrap();
    assert_eq!(column.as_str(), "id");
}

#[test]
fn derived_model_renders_insert_with_lifecycle_columns() {
    let built = render::render_insert_model(
        &Dialect::POSTGRES,
        &alice(),
        User::table(),
        Utc::now(),
    )
    .unwrap();
    assert_eq!(
        built.sql,
        r#"INSERT INTO "user" ("id", "full_name", "age", "created_at", "updated_at") VALUES ($1, $2, $3, $4, $5) RETURNING "id", "full_name", "age", "created_at", "updated_at""#
    );
    assert_eq!(built.params.len(), 5);
}

#[test]
fn generated_primary_key_is_not_inserted() {
    let address = UserAddress {
        id: 0,
        user_id: "u1".into(),
        city: "Oslo".into(),
    };
    let built = render::render_insert_model(
        &Dialect::POSTGRES,
        &address,
        UserAddress::table(),
        Utc::now(),
    )
    .unwrap();
    assert_eq!(
        built.sql,
        r#"INSERT INTO "user_address" ("user_id", "city") VALUES ($1, $2) RETURNING "id", "user_id", "city""#
    );
}

#[test]
fn derived_models_drive_relation_rendering() {
    let qb = Qb::table::<TableUser>().and("user.age", Op::gt(18));
    let built =
        render::render_relation::<UserWithAddress>(&Dialect::POSTGRES, &qb, false).unwrap();
    assert_eq!(
        built.sql,
        concat!(
            r#"SELECT "user"."id" AS "user.id", "user"."full_name" AS "user.full_name", "#,
            r#""user"."age" AS "user.age", "user"."created_at" AS "user.created_at", "#,
            r#""user"."updated_at" AS "user.updated_at", "#,
            r#""user_address"."id" AS "user_address.id", "user_address"."user_id" AS "user_address.user_id", "#,
            r#""user_address"."city" AS "user_address.city" "#,
            r#"FROM "user" LEFT JOIN "user_address" ON "user"."id" = "user_address"."user_id" "#,
            r#"WHERE "user"."age" > $1 AND "user"."deleted_at" IS NULL AND "user_address"."removed_at" IS NULL"#,
        )
    );

    let composed = UserWithAddress::compose(alice(), None);
    assert_eq!(composed.user.id, "u1");
    assert!(composed.address.is_none());
}

#[derive(Debug, Clone, Model)]
#[sq(table = "session")]
struct Session {
    #[sq(pk)]
    id: uuid::Uuid,
    user_id: String,
}

#[test]
fn uuid_primary_key_binds_as_a_parameter() {
    let session = Session {
        id: uuid::Uuid::new_v4(),
        user_id: "u1".into(),
    };
    let (column, _) = session.primary_key().unwrap();
    assert_eq!(column, Session::COL_ID);

    let qb = Qb::table::<Session>()
        .and(Session::COL_USER_ID, Op::equal(session.user_id.clone()));
    let built = render::render_hard_delete(&Dialect::POSTGRES, &qb).unwrap();
    assert_eq!(built.sql, r#"DELETE FROM "session" WHERE "user_id" = $1"#);
}
