use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

use crate::db::address_store::AddressStore;
use crate::db::carrier_store::CarrierStore;
use crate::db::sender_store::SenderStore;
use crate::db::shipment_store::ShipmentStore;
use crate::db::user_store::UserStore;
use crate::db::DbPool;
use crate::error::AppError;
use crate::models::address::NewAddress;
use crate::models::carrier::{CarrierPatch, NewCarrier};
use crate::models::sender::NewSender;
use crate::models::shipment::{NewShipment, ShipmentFilter, ShipmentPatch};

// A single connection keeps every query on the same in-memory
// database.
async fn setup_test_db() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");

    crate::db::setup_database(&pool)
        .await
        .expect("failed to create schema");

    pool
}

async fn create_test_carrier(store: &CarrierStore, name: &str) -> i64 {
    store
        .create(NewCarrier {
            name: Some(name.to_string()),
            ..Default::default()
        })
        .await
        .expect("failed to create carrier")
}

async fn create_test_sender(store: &SenderStore, name: &str) -> i64 {
    store
        .create(NewSender {
            name: Some(name.to_string()),
            ..Default::default()
        })
        .await
        .expect("failed to create sender")
}

async fn create_test_address(store: &AddressStore, recipient_name: &str) -> i64 {
    store
        .create(NewAddress {
            recipient_name: Some(recipient_name.to_string()),
            recipient_phone: Some("18611112222".to_string()),
            recipient_address: Some("上海市浦东新区陆家嘴环路1000号".to_string()),
            ..Default::default()
        })
        .await
        .expect("failed to create address")
}

fn new_shipment(
    tracking_number: &str,
    carrier_id: i64,
    sender_id: i64,
    address_id: i64,
    shipping_date: &str,
) -> NewShipment {
    NewShipment {
        tracking_number: Some(tracking_number.to_string()),
        carrier_id: Some(carrier_id),
        sender_id: Some(sender_id),
        address_id: Some(address_id),
        shipping_date: Some(shipping_date.to_string()),
        ..Default::default()
    }
}

// Sets up one carrier, sender and address and returns their ids next
// to the stores.
async fn setup_ledger() -> (ShipmentStore, CarrierStore, SenderStore, AddressStore, i64, i64, i64) {
    let pool = setup_test_db().await;
    let carriers = CarrierStore::new(pool.clone());
    let senders = SenderStore::new(pool.clone());
    let addresses = AddressStore::new(pool.clone());
    let shipments = ShipmentStore::new(pool);

    let carrier_id = create_test_carrier(&carriers, "顺丰速运").await;
    let sender_id = create_test_sender(&senders, "鑫达公司").await;
    let address_id = create_test_address(&addresses, "李先生").await;

    (shipments, carriers, senders, addresses, carrier_id, sender_id, address_id)
}

mod registry_tests {
    use super::*;

    #[tokio::test]
    async fn create_and_read_back_round_trip() {
        let pool = setup_test_db().await;
        let store = CarrierStore::new(pool);

        let id = store
            .create(NewCarrier {
                name: Some("中通快递".to_string()),
                contact_person: Some("李主管".to_string()),
                phone: Some("13900139000".to_string()),
                address: Some("上海市青浦区中通总部".to_string()),
            })
            .await
            .expect("create failed");

        let carrier = store.get(id).await.expect("get failed");
        assert_eq!(carrier.name, "中通快递");
        assert_eq!(carrier.contact_person, "李主管");
        assert_eq!(carrier.phone, "13900139000");
        assert_eq!(carrier.address, "上海市青浦区中通总部");
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let pool = setup_test_db().await;
        let store = CarrierStore::new(pool);

        let err = store
            .create(NewCarrier {
                name: Some(String::new()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = store.create(NewCarrier::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn address_requires_name_phone_and_street() {
        let pool = setup_test_db().await;
        let store = AddressStore::new(pool);

        let err = store
            .create(NewAddress {
                recipient_name: Some("王女士".to_string()),
                recipient_phone: Some("18633334444".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let pool = setup_test_db().await;
        let store = CarrierStore::new(pool);

        create_test_carrier(&store, "顺丰速运").await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        create_test_carrier(&store, "韵达快递").await;

        let carriers = store.list().await.expect("list failed");
        assert_eq!(carriers.len(), 2);
        assert_eq!(carriers[0].name, "韵达快递");
        assert_eq!(carriers[1].name, "顺丰速运");
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let pool = setup_test_db().await;
        let store = SenderStore::new(pool);

        let err = store.get(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_merges_omitted_fields() {
        let pool = setup_test_db().await;
        let store = CarrierStore::new(pool);

        let id = store
            .create(NewCarrier {
                name: Some("圆通速递".to_string()),
                contact_person: Some("王经理".to_string()),
                phone: Some("13700137000".to_string()),
                ..Default::default()
            })
            .await
            .expect("create failed");

        store
            .update(
                id,
                CarrierPatch {
                    phone: Some(Some("13700137999".to_string())),
                    ..Default::default()
                },
            )
            .await
            .expect("update failed");

        let carrier = store.get(id).await.expect("get failed");
        assert_eq!(carrier.name, "圆通速递");
        assert_eq!(carrier.contact_person, "王经理");
        assert_eq!(carrier.phone, "13700137999");
    }

    #[tokio::test]
    async fn blank_name_in_patch_keeps_existing() {
        let pool = setup_test_db().await;
        let store = CarrierStore::new(pool);

        let id = create_test_carrier(&store, "申通快递").await;
        store
            .update(
                id,
                CarrierPatch {
                    name: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .expect("update failed");

        assert_eq!(store.get(id).await.unwrap().name, "申通快递");
    }

    #[tokio::test]
    async fn contact_person_clears_on_null_but_keeps_on_omission() {
        let pool = setup_test_db().await;
        let store = CarrierStore::new(pool);

        let id = store
            .create(NewCarrier {
                name: Some("顺丰速运".to_string()),
                contact_person: Some("张经理".to_string()),
                ..Default::default()
            })
            .await
            .expect("create failed");

        // Omitted: keep.
        store
            .update(id, CarrierPatch::default())
            .await
            .expect("update failed");
        assert_eq!(store.get(id).await.unwrap().contact_person, "张经理");

        // Explicit null: clear.
        store
            .update(
                id,
                CarrierPatch {
                    contact_person: Some(None),
                    ..Default::default()
                },
            )
            .await
            .expect("update failed");
        assert_eq!(store.get(id).await.unwrap().contact_person, "");
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let pool = setup_test_db().await;
        let store = AddressStore::new(pool);

        let err = store.delete(9).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

mod shipment_tests {
    use super::*;

    #[tokio::test]
    async fn create_requires_all_identity_fields() {
        let (shipments, _, _, _, carrier_id, sender_id, address_id) = setup_ledger().await;

        let mut missing_date = new_shipment("SF100", carrier_id, sender_id, address_id, "");
        missing_date.shipping_date = None;
        let err = shipments.create(missing_date).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut missing_carrier = new_shipment("SF100", carrier_id, sender_id, address_id, "2024-06-01");
        missing_carrier.carrier_id = None;
        let err = shipments.create(missing_carrier).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn create_applies_defaults() {
        let (shipments, _, _, _, carrier_id, sender_id, address_id) = setup_ledger().await;

        let id = shipments
            .create(new_shipment("SF100", carrier_id, sender_id, address_id, "2024-06-01"))
            .await
            .expect("create failed");

        let shipment = shipments.get(id).await.expect("get failed");
        assert_eq!(shipment.status, "shipped");
        assert_eq!(shipment.weight, 0.0);
        assert_eq!(shipment.amount, 0.0);
        assert_eq!(shipment.notes, "");
        assert_eq!(shipment.shipping_date.to_string(), "2024-06-01");
    }

    #[tokio::test]
    async fn duplicate_tracking_number_is_rejected_without_side_effects() {
        let (shipments, _, _, _, carrier_id, sender_id, address_id) = setup_ledger().await;

        shipments
            .create(new_shipment("SF100", carrier_id, sender_id, address_id, "2024-06-01"))
            .await
            .expect("first create failed");

        let err = shipments
            .create(new_shipment("SF100", carrier_id, sender_id, address_id, "2024-06-02"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let all = shipments.list(&ShipmentFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].shipping_date.to_string(), "2024-06-01");
    }

    #[tokio::test]
    async fn create_rejects_dangling_references() {
        let (shipments, _, _, _, carrier_id, sender_id, _) = setup_ledger().await;

        let err = shipments
            .create(new_shipment("SF200", carrier_id, sender_id, 999, "2024-06-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_only_status_keeps_everything_else() {
        let (shipments, _, _, _, carrier_id, sender_id, address_id) = setup_ledger().await;

        let mut fields = new_shipment("SF100", carrier_id, sender_id, address_id, "2024-06-01");
        fields.weight = 2.5;
        fields.amount = 18.0;
        fields.notes = Some("fragile".to_string());
        let id = shipments.create(fields).await.expect("create failed");

        shipments
            .update(
                id,
                ShipmentPatch {
                    status: Some("delivered".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("update failed");

        let shipment = shipments.get(id).await.expect("get failed");
        assert_eq!(shipment.status, "delivered");
        assert_eq!(shipment.tracking_number, "SF100");
        assert_eq!(shipment.carrier_id, carrier_id);
        assert_eq!(shipment.sender_id, sender_id);
        assert_eq!(shipment.address_id, address_id);
        assert_eq!(shipment.weight, 2.5);
        assert_eq!(shipment.amount, 18.0);
        assert_eq!(shipment.shipping_date.to_string(), "2024-06-01");
        assert_eq!(shipment.notes, "fragile");
    }

    #[tokio::test]
    async fn submitted_zero_weight_is_stored() {
        let (shipments, _, _, _, carrier_id, sender_id, address_id) = setup_ledger().await;

        let mut fields = new_shipment("SF100", carrier_id, sender_id, address_id, "2024-06-01");
        fields.weight = 2.5;
        let id = shipments.create(fields).await.expect("create failed");

        shipments
            .update(
                id,
                ShipmentPatch {
                    weight: Some(0.0),
                    ..Default::default()
                },
            )
            .await
            .expect("update failed");

        assert_eq!(shipments.get(id).await.unwrap().weight, 0.0);
    }

    #[tokio::test]
    async fn tracking_number_change_rechecks_uniqueness() {
        let (shipments, _, _, _, carrier_id, sender_id, address_id) = setup_ledger().await;

        shipments
            .create(new_shipment("SF100", carrier_id, sender_id, address_id, "2024-06-01"))
            .await
            .expect("create failed");
        let second = shipments
            .create(new_shipment("SF200", carrier_id, sender_id, address_id, "2024-06-02"))
            .await
            .expect("create failed");

        let err = shipments
            .update(
                second,
                ShipmentPatch {
                    tracking_number: Some("SF100".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Re-submitting the unchanged number is not a collision.
        shipments
            .update(
                second,
                ShipmentPatch {
                    tracking_number: Some("SF200".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("update with unchanged tracking number failed");
    }

    #[tokio::test]
    async fn get_with_details_joins_registry_fields() {
        let (shipments, _, _, _, carrier_id, sender_id, address_id) = setup_ledger().await;

        let id = shipments
            .create(new_shipment("SF100", carrier_id, sender_id, address_id, "2024-06-01"))
            .await
            .expect("create failed");

        let details = shipments.get_with_details(id).await.expect("get failed");
        assert_eq!(details.carrier_name.as_deref(), Some("顺丰速运"));
        assert_eq!(details.sender_name.as_deref(), Some("鑫达公司"));
        assert_eq!(details.recipient_name.as_deref(), Some("李先生"));
        assert_eq!(details.recipient_phone.as_deref(), Some("18611112222"));
    }

    // The referential guard scenario end to end: deleting the carrier
    // is blocked while a shipment references it and allowed after the
    // shipment is gone.
    #[tokio::test]
    async fn carrier_delete_blocked_until_shipment_removed() {
        let (shipments, carriers, _, _, carrier_id, sender_id, address_id) = setup_ledger().await;

        let shipment_id = shipments
            .create(new_shipment("SF100", carrier_id, sender_id, address_id, "2024-06-01"))
            .await
            .expect("create failed");

        let err = carriers.delete(carrier_id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        shipments.delete(shipment_id).await.expect("delete failed");
        carriers
            .delete(carrier_id)
            .await
            .expect("delete after unreferencing failed");

        assert!(carriers.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn shipment_delete_missing_is_not_found() {
        let (shipments, _, _, _, _, _, _) = setup_ledger().await;

        let err = shipments.delete(77).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

mod query_tests {
    use super::*;

    async fn seed_shipments(
        shipments: &ShipmentStore,
        carrier_id: i64,
        sender_id: i64,
        address_id: i64,
    ) {
        for (tracking, date, amount, status, notes) in [
            ("SF100", "2024-06-01", 10.0, "shipped", "first batch"),
            ("SF101", "2024-06-15", 25.0, "delivered", ""),
            ("ZT300", "2024-05-20", 40.0, "in_transit", "Urgent order"),
        ] {
            let mut fields = new_shipment(tracking, carrier_id, sender_id, address_id, date);
            fields.amount = amount;
            fields.status = Some(status.to_string());
            fields.notes = Some(notes.to_string());
            shipments.create(fields).await.expect("seed create failed");
        }
    }

    #[tokio::test]
    async fn month_filter_restricts_to_that_month() {
        let (shipments, _, _, _, carrier_id, sender_id, address_id) = setup_ledger().await;
        seed_shipments(&shipments, carrier_id, sender_id, address_id).await;

        let filter = ShipmentFilter {
            month: Some("2024-06".to_string()),
            ..Default::default()
        };
        let rows = shipments.list(&filter).await.expect("list failed");
        assert_eq!(rows.len(), 2);
        assert!(rows
            .iter()
            .all(|r| r.shipping_date.to_string().starts_with("2024-06")));
    }

    #[tokio::test]
    async fn filters_compose_conjunctively() {
        let (shipments, carriers, _, _, carrier_id, sender_id, address_id) = setup_ledger().await;
        seed_shipments(&shipments, carrier_id, sender_id, address_id).await;

        let other_carrier = create_test_carrier(&carriers, "韵达快递").await;
        let mut fields = new_shipment("YD500", other_carrier, sender_id, address_id, "2024-06-10");
        fields.status = Some("delivered".to_string());
        shipments.create(fields).await.expect("create failed");

        let filter = ShipmentFilter {
            month: Some("2024-06".to_string()),
            carrier_id: Some(carrier_id.to_string()),
            status: Some("delivered".to_string()),
            ..Default::default()
        };
        let rows = shipments.list(&filter).await.expect("list failed");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tracking_number, "SF101");
    }

    #[tokio::test]
    async fn all_sentinel_disables_a_filter() {
        let (shipments, _, _, _, carrier_id, sender_id, address_id) = setup_ledger().await;
        seed_shipments(&shipments, carrier_id, sender_id, address_id).await;

        let filter = ShipmentFilter {
            carrier_id: Some("all".to_string()),
            status: Some("all".to_string()),
            ..Default::default()
        };
        let rows = shipments.list(&filter).await.expect("list failed");
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn unparseable_carrier_id_matches_nothing() {
        let (shipments, _, _, _, carrier_id, sender_id, address_id) = setup_ledger().await;
        seed_shipments(&shipments, carrier_id, sender_id, address_id).await;

        let filter = ShipmentFilter {
            carrier_id: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(shipments.list(&filter).await.unwrap().is_empty());

        let summary = shipments
            .summary(None, filter.carrier_filter())
            .await
            .expect("summary failed");
        assert!(summary.details.is_empty());
        assert_eq!(summary.totals.total_count, 0);
    }

    #[tokio::test]
    async fn search_matches_tracking_number_or_notes_case_insensitively() {
        let (shipments, _, _, _, carrier_id, sender_id, address_id) = setup_ledger().await;
        seed_shipments(&shipments, carrier_id, sender_id, address_id).await;

        let filter = ShipmentFilter {
            search: Some("sf1".to_string()),
            ..Default::default()
        };
        let rows = shipments.list(&filter).await.expect("list failed");
        assert_eq!(rows.len(), 2);

        let filter = ShipmentFilter {
            search: Some("urgent".to_string()),
            ..Default::default()
        };
        let rows = shipments.list(&filter).await.expect("list failed");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tracking_number, "ZT300");
    }

    #[tokio::test]
    async fn listing_orders_by_date_then_creation() {
        let (shipments, _, _, _, carrier_id, sender_id, address_id) = setup_ledger().await;

        shipments
            .create(new_shipment("SF100", carrier_id, sender_id, address_id, "2024-06-01"))
            .await
            .expect("create failed");
        tokio::time::sleep(Duration::from_millis(10)).await;
        shipments
            .create(new_shipment("SF101", carrier_id, sender_id, address_id, "2024-06-01"))
            .await
            .expect("create failed");
        shipments
            .create(new_shipment("SF102", carrier_id, sender_id, address_id, "2024-06-05"))
            .await
            .expect("create failed");

        let rows = shipments
            .list(&ShipmentFilter::default())
            .await
            .expect("list failed");
        let order: Vec<&str> = rows.iter().map(|r| r.tracking_number.as_str()).collect();
        assert_eq!(order, ["SF102", "SF101", "SF100"]);
    }

    #[tokio::test]
    async fn summary_totals_equal_sum_of_groups() {
        let (shipments, carriers, _, _, carrier_id, sender_id, address_id) = setup_ledger().await;
        seed_shipments(&shipments, carrier_id, sender_id, address_id).await;

        let other_carrier = create_test_carrier(&carriers, "韵达快递").await;
        let mut fields = new_shipment("YD500", other_carrier, sender_id, address_id, "2024-06-10");
        fields.amount = 7.5;
        fields.weight = 1.2;
        shipments.create(fields).await.expect("create failed");

        for filter_month in [None, Some("2024-06")] {
            let summary = shipments
                .summary(filter_month, None)
                .await
                .expect("summary failed");

            let count: i64 = summary.details.iter().map(|d| d.total_count).sum();
            let amount: f64 = summary.details.iter().map(|d| d.total_amount).sum();
            let weight: f64 = summary.details.iter().map(|d| d.total_weight).sum();
            assert_eq!(summary.totals.total_count, count);
            assert_eq!(summary.totals.total_amount, amount);
            assert_eq!(summary.totals.total_weight, weight);
        }

        let unfiltered = shipments.summary(None, None).await.unwrap();
        assert_eq!(unfiltered.totals.total_count, 4);
        assert_eq!(unfiltered.totals.total_amount, 82.5);
    }

    #[tokio::test]
    async fn summary_orders_by_month_then_amount() {
        let (shipments, carriers, _, _, carrier_id, sender_id, address_id) = setup_ledger().await;
        seed_shipments(&shipments, carrier_id, sender_id, address_id).await;

        let other_carrier = create_test_carrier(&carriers, "韵达快递").await;
        let mut fields = new_shipment("YD500", other_carrier, sender_id, address_id, "2024-06-10");
        fields.amount = 99.0;
        shipments.create(fields).await.expect("create failed");

        let summary = shipments.summary(None, None).await.expect("summary failed");
        let months: Vec<&str> = summary.details.iter().map(|d| d.month.as_str()).collect();
        assert_eq!(months, ["2024-06", "2024-06", "2024-05"]);
        // Within June the bigger amount comes first.
        assert_eq!(summary.details[0].total_amount, 99.0);
        assert_eq!(summary.details[1].total_amount, 35.0);
    }

    #[tokio::test]
    async fn summary_of_empty_ledger_has_zero_totals() {
        let (shipments, _, _, _, _, _, _) = setup_ledger().await;

        let summary = shipments.summary(None, None).await.expect("summary failed");
        assert!(summary.details.is_empty());
        assert_eq!(summary.totals.total_count, 0);
        assert_eq!(summary.totals.total_amount, 0.0);
        assert_eq!(summary.totals.total_weight, 0.0);
    }

    #[tokio::test]
    async fn monthly_groups_ignore_carrier() {
        let (shipments, carriers, _, _, carrier_id, sender_id, address_id) = setup_ledger().await;
        seed_shipments(&shipments, carrier_id, sender_id, address_id).await;

        let other_carrier = create_test_carrier(&carriers, "韵达快递").await;
        let mut fields = new_shipment("YD500", other_carrier, sender_id, address_id, "2024-06-10");
        fields.amount = 5.0;
        shipments.create(fields).await.expect("create failed");

        let monthly = shipments.monthly().await.expect("monthly failed");
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].month, "2024-06");
        assert_eq!(monthly[0].total_count, 3);
        assert_eq!(monthly[0].total_amount, 40.0);
        assert_eq!(monthly[1].month, "2024-05");
        assert_eq!(monthly[1].total_count, 1);
    }
}

mod user_tests {
    use super::*;
    use crate::services::auth_service::{hash_password, verify_password, AuthService};

    #[tokio::test]
    async fn password_hash_round_trip() {
        let hash = hash_password("1qaz2wsx").expect("hash failed");
        assert!(verify_password("1qaz2wsx", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[tokio::test]
    async fn session_cookie_round_trip() {
        let auth = AuthService::new("test-secret", 24);
        let cookie = auth.issue_session(1, "cruiseven").expect("issue failed");

        // The Set-Cookie value doubles as a Cookie header for the test.
        let header = cookie.split(';').next().unwrap();
        let claims = auth.verify_session(header).expect("verify failed");
        assert_eq!(claims.sub, 1);
        assert_eq!(claims.username, "cruiseven");
    }

    #[tokio::test]
    async fn session_rejects_garbage_and_foreign_tokens() {
        let auth = AuthService::new("test-secret", 24);
        assert!(auth.verify_session("session=not-a-token").is_none());
        assert!(auth.verify_session("other=value").is_none());

        let foreign = AuthService::new("another-secret", 24)
            .issue_session(1, "cruiseven")
            .unwrap();
        let header = foreign.split(';').next().unwrap().to_string();
        assert!(auth.verify_session(&header).is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let pool = setup_test_db().await;
        let store = UserStore::new(pool);

        store.create("cruiseven", "1qaz2wsx").await.expect("create failed");
        let err = store.create("cruiseven", "other").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn status_must_be_active_or_disabled() {
        let pool = setup_test_db().await;
        let store = UserStore::new(pool);

        let id = store.create("operator", "secret").await.expect("create failed");
        let err = store.set_status(id, "frozen").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        store.set_status(id, "disabled").await.expect("set_status failed");
        assert_eq!(store.get(id).await.unwrap().status, "disabled");
    }

    #[tokio::test]
    async fn rename_collision_is_rejected() {
        let pool = setup_test_db().await;
        let store = UserStore::new(pool);

        store.create("alice", "pw1").await.expect("create failed");
        let bob = store.create("bob", "pw2").await.expect("create failed");

        let err = store
            .update(bob, Some("alice".to_string()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}

mod admin_guard_tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::handlers::{api_router, AppState};
    use crate::services::auth_service::AuthService;
    use crate::services::tracking_service::TrackingService;

    async fn setup_app() -> (Router, Arc<AppState>, String) {
        let pool = setup_test_db().await;
        crate::db::seed_admin(&pool, "cruiseven", "1qaz2wsx")
            .await
            .expect("failed to seed operator");

        let state = Arc::new(AppState {
            users: UserStore::new(pool.clone()),
            carriers: CarrierStore::new(pool.clone()),
            senders: SenderStore::new(pool.clone()),
            addresses: AddressStore::new(pool.clone()),
            shipments: ShipmentStore::new(pool),
            auth: AuthService::new("test-secret", 24),
            tracking: TrackingService::new("http://localhost:0".to_string()),
            admin_username: "cruiseven".to_string(),
        });

        let admin = state
            .users
            .get_by_username("cruiseven")
            .await
            .expect("lookup failed")
            .expect("operator missing");
        let cookie = session_cookie(&state, admin.id, "cruiseven");

        (api_router(state.clone()), state, cookie)
    }

    fn session_cookie(state: &AppState, id: i64, username: &str) -> String {
        let set_cookie = state
            .auth
            .issue_session(id, username)
            .expect("failed to issue session");
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<&str>,
    ) -> Value {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("invalid request");

        let response = app.clone().oneshot(request).await.expect("request failed");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        serde_json::from_slice(&bytes).expect("response was not JSON")
    }

    #[tokio::test]
    async fn user_routes_require_a_session() {
        let (app, _, _) = setup_app().await;

        let body = send(&app, Method::GET, "/api/users", None, None).await;
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn non_admin_session_cannot_administer_users() {
        let (app, state, _) = setup_app().await;
        let bob = state.users.create("bob", "pw").await.expect("create failed");
        let cookie = session_cookie(&state, bob, "bob");

        let body = send(&app, Method::GET, "/api/users", Some(&cookie), None).await;
        assert_eq!(body["success"], false);

        let body = send(
            &app,
            Method::POST,
            "/api/users",
            Some(&cookie),
            Some(r#"{"username": "eve", "password": "pw"}"#),
        )
        .await;
        assert_eq!(body["success"], false);
        assert!(state
            .users
            .get_by_username("eve")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn operator_account_cannot_be_renamed() {
        let (app, state, cookie) = setup_app().await;
        let admin = state
            .users
            .get_by_username("cruiseven")
            .await
            .unwrap()
            .unwrap();

        let body = send(
            &app,
            Method::PUT,
            &format!("/api/users/{}", admin.id),
            Some(&cookie),
            Some(r#"{"username": "other"}"#),
        )
        .await;
        assert_eq!(body["success"], false);
        assert!(state
            .users
            .get_by_username("cruiseven")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn operator_account_cannot_be_deleted() {
        let (app, state, cookie) = setup_app().await;
        let admin = state
            .users
            .get_by_username("cruiseven")
            .await
            .unwrap()
            .unwrap();

        let body = send(
            &app,
            Method::DELETE,
            &format!("/api/users/{}", admin.id),
            Some(&cookie),
            None,
        )
        .await;
        assert_eq!(body["success"], false);
        assert!(state
            .users
            .get_by_username("cruiseven")
            .await
            .unwrap()
            .is_some());
    }

    // Disabling the operator would lock everyone out of user
    // administration once the session expires.
    #[tokio::test]
    async fn operator_account_cannot_be_disabled() {
        let (app, state, cookie) = setup_app().await;
        let admin = state
            .users
            .get_by_username("cruiseven")
            .await
            .unwrap()
            .unwrap();

        let body = send(
            &app,
            Method::PUT,
            &format!("/api/users/{}/status", admin.id),
            Some(&cookie),
            Some(r#"{"status": "disabled"}"#),
        )
        .await;
        assert_eq!(body["success"], false);
        assert_eq!(state.users.get(admin.id).await.unwrap().status, "active");

        // Other accounts can still be disabled through the route.
        let bob = state.users.create("bob", "pw").await.expect("create failed");
        let body = send(
            &app,
            Method::PUT,
            &format!("/api/users/{bob}/status"),
            Some(&cookie),
            Some(r#"{"status": "disabled"}"#),
        )
        .await;
        assert_eq!(body["success"], true);
        assert_eq!(state.users.get(bob).await.unwrap().status, "disabled");
    }
}

mod payload_tests {
    use super::*;
    use crate::models::address::AddressPatch;

    #[test]
    fn omitted_null_and_value_deserialize_as_three_states() {
        let patch: AddressPatch = serde_json::from_str("{}").unwrap();
        assert_eq!(patch.contact_person, None);

        let patch: AddressPatch = serde_json::from_str(r#"{"contact_person": null}"#).unwrap();
        assert_eq!(patch.contact_person, Some(None));

        let patch: AddressPatch =
            serde_json::from_str(r#"{"contact_person": "张三"}"#).unwrap();
        assert_eq!(patch.contact_person, Some(Some("张三".to_string())));
    }

    #[test]
    fn weight_accepts_numeric_strings_and_coerces_garbage_to_zero() {
        let new: NewShipment = serde_json::from_str(r#"{"weight": "12.5"}"#).unwrap();
        assert_eq!(new.weight, 12.5);

        let new: NewShipment = serde_json::from_str(r#"{"weight": "heavy"}"#).unwrap();
        assert_eq!(new.weight, 0.0);

        let new: NewShipment = serde_json::from_str("{}").unwrap();
        assert_eq!(new.weight, 0.0);
    }

    #[test]
    fn patch_weight_distinguishes_absent_from_zero() {
        let patch: ShipmentPatch = serde_json::from_str("{}").unwrap();
        assert_eq!(patch.weight, None);

        let patch: ShipmentPatch = serde_json::from_str(r#"{"weight": 0}"#).unwrap();
        assert_eq!(patch.weight, Some(0.0));
    }

    #[test]
    fn registry_ids_accept_string_form_values() {
        let new: NewShipment = serde_json::from_str(r#"{"carrier_id": "3"}"#).unwrap();
        assert_eq!(new.carrier_id, Some(3));

        let new: NewShipment = serde_json::from_str(r#"{"carrier_id": 3}"#).unwrap();
        assert_eq!(new.carrier_id, Some(3));
    }
}

mod tracking_tests {
    use crate::services::tracking_service::status_from_latest_trace;

    #[test]
    fn keyword_classes_map_to_statuses() {
        assert_eq!(status_from_latest_trace("您的快件已签收，感谢使用"), "signed");
        assert_eq!(status_from_latest_trace("快件正在派送途中"), "delivering");
        assert_eq!(status_from_latest_trace("已揽收"), "picked_up");
        assert_eq!(status_from_latest_trace("运输中，下一站上海"), "in_transit");
        assert_eq!(status_from_latest_trace("快件已退回发件方"), "returned");
        assert_eq!(status_from_latest_trace("派件异常，请联系网点"), "exception");
    }

    #[test]
    fn first_matching_class_wins() {
        // Signed-for outranks delivering even when both appear.
        assert_eq!(status_from_latest_trace("已签收（派送员代交）"), "signed");
        // Delivering outranks the returned keyword.
        assert_eq!(status_from_latest_trace("退回件正在投递"), "delivering");
    }

    #[test]
    fn unknown_descriptions_default_to_in_transit() {
        assert_eq!(status_from_latest_trace("到达处理中心"), "in_transit");
        assert_eq!(status_from_latest_trace(""), "in_transit");
    }
}
