use std::collections::HashSet;

use models::{contact, phone_number};
use sea_orm::sea_query::{BinOper, Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tracing::debug;

use crate::contact::domain::{ContactChanges, ContactWithPhones};
use crate::errors::ServiceError;

/// `%query%` with LIKE metacharacters escaped by a backslash.
pub fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// `LOWER(col) LIKE LOWER(pattern)`: both sides folded by the same function.
/// Postgres uses backslash as the default LIKE escape.
fn contains_ci<C: sea_orm::sea_query::IntoColumnRef>(col: C, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col))).binary(BinOper::Like, Func::lower(Expr::val(pattern)))
}

fn folded_contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Name matches first, then contacts matched only through a number; each group
/// keeps the input (id) order and a contact appears once. Folding is Unicode
/// lowercase on both sides.
pub fn filter_matches(all: Vec<ContactWithPhones>, query: &str) -> Vec<ContactWithPhones> {
    let needle = query.to_lowercase();
    let (by_name, rest): (Vec<_>, Vec<_>) = all.into_iter().partition(|c| folded_contains(&c.contact.name, &needle));
    let by_number = rest.into_iter().filter(|c| c.numbers().any(|n| folded_contains(n, &needle)));
    by_name.into_iter().chain(by_number).collect()
}

/// All contacts with their numbers, ordered by contact id then number id.
pub async fn list_contacts<C: ConnectionTrait>(db: &C) -> Result<Vec<ContactWithPhones>, ServiceError> {
    let rows = contact::Entity::find()
        .find_with_related(phone_number::Entity)
        .order_by_asc(contact::Column::Id)
        .order_by_asc(phone_number::Column::Id)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(ContactWithPhones::from).collect())
}

async fn contacts_by_ids<C: ConnectionTrait>(db: &C, ids: Vec<i32>) -> Result<Vec<ContactWithPhones>, ServiceError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = contact::Entity::find()
        .filter(contact::Column::Id.is_in(ids))
        .find_with_related(phone_number::Entity)
        .order_by_asc(contact::Column::Id)
        .order_by_asc(phone_number::Column::Id)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(ContactWithPhones::from).collect())
}

/// Case-insensitive substring search over names and numbers.
///
/// Name matches come first, then contacts found only through a number; both
/// groups are ordered by id and each contact appears once. SQLite's `LOWER`
/// folds ASCII only, so there the match runs in Rust over the full list.
pub async fn search_contacts<C: ConnectionTrait>(db: &C, query: &str) -> Result<Vec<ContactWithPhones>, ServiceError> {
    if db.get_database_backend() == DbBackend::Sqlite {
        let all = list_contacts(db).await?;
        return Ok(filter_matches(all, query));
    }

    let pattern = like_pattern(query);

    let by_name = contact::Entity::find()
        .filter(contains_ci((contact::Entity, contact::Column::Name), &pattern))
        .find_with_related(phone_number::Entity)
        .order_by_asc(contact::Column::Id)
        .order_by_asc(phone_number::Column::Id)
        .all(db)
        .await?;

    let number_owner_ids: Vec<i32> = phone_number::Entity::find()
        .select_only()
        .column(phone_number::Column::ContactId)
        .filter(contains_ci((phone_number::Entity, phone_number::Column::Number), &pattern))
        .order_by_asc(phone_number::Column::ContactId)
        .into_tuple()
        .all(db)
        .await?;

    let mut seen: HashSet<i32> = by_name.iter().map(|(c, _)| c.id).collect();
    let extra: Vec<i32> = number_owner_ids.into_iter().filter(|id| seen.insert(*id)).collect();
    debug!(name_hits = by_name.len(), number_only_hits = extra.len(), "contact search");

    let mut results: Vec<ContactWithPhones> = by_name.into_iter().map(ContactWithPhones::from).collect();
    results.extend(contacts_by_ids(db, extra).await?);
    Ok(results)
}

pub async fn find_contact<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<contact::Model>, ServiceError> {
    Ok(contact::Entity::find_by_id(id).one(db).await?)
}

pub async fn get_contact<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<ContactWithPhones>, ServiceError> {
    let Some(found) = find_contact(db, id).await? else { return Ok(None) };
    let phones = phone_number::list_for_contact(db, found.id).await?;
    Ok(Some(ContactWithPhones { contact: found, phone_numbers: phones }))
}

/// Insert the contact and its numbers in one transaction.
pub async fn create_contact(
    db: &DatabaseConnection,
    name: &str,
    image: Option<String>,
    numbers: &[String],
) -> Result<ContactWithPhones, ServiceError> {
    let txn = db.begin().await?;
    let created = contact::create(&txn, name, image).await?;
    let phones = phone_number::create_many(&txn, created.id, numbers).await?;
    txn.commit().await?;
    Ok(ContactWithPhones { contact: created, phone_numbers: phones })
}

/// Apply `changes` in one transaction. A non-empty number list replaces the
/// stored set; the header row is returned without numbers.
pub async fn update_contact(db: &DatabaseConnection, id: i32, changes: ContactChanges) -> Result<contact::Model, ServiceError> {
    let txn = db.begin().await?;
    let Some(existing) = find_contact(&txn, id).await? else {
        return Err(ServiceError::not_found("contact"));
    };

    if !changes.phone_numbers.is_empty() {
        let removed = phone_number::delete_for_contact(&txn, id).await?;
        phone_number::create_many(&txn, id, &changes.phone_numbers).await?;
        debug!(contact_id = id, removed, inserted = changes.phone_numbers.len(), "phone numbers replaced");
    }

    let name = changes.name.unwrap_or_else(|| existing.name.clone());
    let image = changes.image.or_else(|| existing.image.clone());
    let mut am: contact::ActiveModel = existing.into();
    am.name = Set(name);
    am.image = Set(image);
    let updated = am.update(&txn).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Delete the contact and its numbers; `None` when the id is unknown.
pub async fn delete_contact(db: &DatabaseConnection, id: i32) -> Result<Option<contact::Model>, ServiceError> {
    let txn = db.begin().await?;
    let Some(existing) = find_contact(&txn, id).await? else { return Ok(None) };
    phone_number::delete_for_contact(&txn, id).await?;
    contact::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    Ok(Some(existing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;
    use sea_orm::{EntityTrait, PaginatorTrait};

    fn nums(v: &[&str]) -> Vec<String> { v.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("JoHn"), "%JoHn%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
        assert_eq!(like_pattern(""), "%%");
    }

    #[tokio::test]
    async fn create_persists_linked_numbers() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let created = create_contact(&db, "John Doe", None, &nums(&["1234567890", "0987654321"])).await?;
        assert_eq!(created.phone_numbers.len(), 2);
        assert!(created.phone_numbers.iter().all(|p| p.contact_id == created.id()));

        let rows = phone_number::Entity::find()
            .filter(phone_number::Column::ContactId.eq(created.id()))
            .count(&db)
            .await?;
        assert_eq!(rows, 2);
        Ok(())
    }

    #[tokio::test]
    async fn failed_create_leaves_nothing_behind() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let res = create_contact(&db, "Half Written", None, &nums(&["123", " "])).await;
        assert!(res.is_err());
        assert_eq!(contact::Entity::find().count(&db).await?, 0);
        assert_eq!(phone_number::Entity::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn search_unions_name_and_number_hits_without_duplicates() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let john = create_contact(&db, "John Doe", None, &nums(&["5550001"])).await?;
        let jane = create_contact(&db, "Jane Roe", None, &nums(&["12345", "99999"])).await?;
        let numeric = create_contact(&db, "Agent 123", None, &nums(&["123", "4123"])).await?;
        let _other = create_contact(&db, "Zed", None, &nums(&["777"])).await?;

        let hits = search_contacts(&db, "JOHN").await?;
        assert_eq!(hits.iter().map(|c| c.id()).collect::<Vec<_>>(), vec![john.id()]);
        assert_eq!(hits[0].phone_numbers.len(), 1);

        // "123" matches Agent 123 by name and by two numbers, Jane by number
        let hits = search_contacts(&db, "123").await?;
        let ids: Vec<i32> = hits.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![numeric.id(), jane.id()]);
        assert_eq!(hits[1].phone_numbers.len(), 2);

        let none = search_contacts(&db, "%").await?;
        assert!(none.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn search_folds_non_ascii_case() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let emile = create_contact(&db, "Émile Zola", None, &nums(&["1"])).await?;
        create_contact(&db, "Other", None, &nums(&["2"])).await?;

        for q in ["Émile", "émile", "ÉMILE", "ZOLA"] {
            let hits = search_contacts(&db, q).await?;
            assert_eq!(hits.iter().map(|c| c.id()).collect::<Vec<_>>(), vec![emile.id()], "query {q}");
        }
        Ok(())
    }

    #[test]
    fn filter_matches_orders_name_hits_before_number_hits() {
        let row = |id: i32, name: &str, number: &str| ContactWithPhones {
            contact: contact::Model { id, name: name.into(), image: None },
            phone_numbers: vec![phone_number::Model { id, number: number.into(), contact_id: id }],
        };
        let all = vec![row(1, "Bob", "042"), row(2, "Ann 42", "7"), row(3, "Cid", "9")];
        let ids: Vec<i32> = filter_matches(all, "42").iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn update_rollback_keeps_old_numbers() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let c = create_contact(&db, "John Doe", None, &nums(&["1234567890", "0987654321"])).await?;

        let res = update_contact(&db, c.id(), ContactChanges { name: Some("Renamed".into()), phone_numbers: nums(&["9", " "]), ..Default::default() }).await;
        assert!(res.is_err());

        let after = get_contact(&db, c.id()).await?.expect("contact");
        assert_eq!(after.contact.name, "John Doe");
        assert_eq!(after.numbers().collect::<Vec<_>>(), vec!["1234567890", "0987654321"]);
        Ok(())
    }

    #[tokio::test]
    async fn update_replaces_or_keeps_numbers() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let c = create_contact(&db, "John Doe", Some("https://img/a.jpg".into()), &nums(&["1234567890", "0987654321"])).await?;

        let kept = update_contact(&db, c.id(), ContactChanges { name: Some("Jane Doe".into()), ..Default::default() }).await?;
        assert_eq!(kept.name, "Jane Doe");
        assert_eq!(kept.image.as_deref(), Some("https://img/a.jpg"));
        assert_eq!(phone_number::list_for_contact(&db, c.id()).await?.len(), 2);

        update_contact(&db, c.id(), ContactChanges { phone_numbers: nums(&["1234567890"]), ..Default::default() }).await?;
        let after = get_contact(&db, c.id()).await?.expect("contact");
        assert_eq!(after.numbers().collect::<Vec<_>>(), vec!["1234567890"]);
        assert_eq!(after.contact.name, "Jane Doe");

        let missing = update_contact(&db, c.id() + 100, ContactChanges::default()).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn delete_removes_contact_and_numbers() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let c = create_contact(&db, "Temp", None, &nums(&["1", "2"])).await?;

        let deleted = delete_contact(&db, c.id()).await?.expect("deleted");
        assert_eq!(deleted.id, c.id());
        assert!(get_contact(&db, c.id()).await?.is_none());
        assert_eq!(phone_number::Entity::find().count(&db).await?, 0);

        assert!(delete_contact(&db, c.id()).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn list_orders_by_id() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        assert!(list_contacts(&db).await?.is_empty());
        let a = create_contact(&db, "B second name", None, &nums(&["2"])).await?;
        let b = create_contact(&db, "A first name", None, &[]).await?;

        let all = list_contacts(&db).await?;
        assert_eq!(all.iter().map(|c| c.id()).collect::<Vec<_>>(), vec![a.id(), b.id()]);
        assert!(all[1].phone_numbers.is_empty());
        Ok(())
    }
}
