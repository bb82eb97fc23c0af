mod common;

use sea_orm::{EntityTrait, PaginatorTrait};
use theater_booking_api::{
    dto::shows::Numeric,
    entity::{Bookings, Users},
    error::AppError,
    middleware::auth::{AuthUser, Role},
    models::Show,
    routes::params::BookingListQuery,
    services::{admin_service, booking_service, show_service},
    state::AppState,
};
use uuid::Uuid;

const FUTURE: &str = "2099-06-01T19:00:00Z";
const PAST: &str = "2001-06-01T19:00:00Z";

async fn create_macbeth(state: &AppState, admin: &AuthUser) -> anyhow::Result<Show> {
    let mut payload = common::show_payload(20, &[PAST, FUTURE]);
    payload.title = Some("Macbeth".into());
    payload.price = Some(Numeric::Int(1000));
    let resp = show_service::create_show(state, admin, payload).await?;
    resp.data.ok_or_else(|| anyhow::anyhow!("create_show returned no data"))
}

#[tokio::test]
async fn stats_sum_revenue_and_rank_shows_by_bookings() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let admin = common::create_account(&db.state, Role::Admin).await?;
    let alice = common::create_account(&db.state, Role::User).await?;
    let bob = common::create_account(&db.state, Role::User).await?;
    let hamlet = common::create_show(&db.state, &admin, 50, &[FUTURE, FUTURE]).await?;
    let macbeth = create_macbeth(&db.state, &admin).await?;

    booking_service::create_bookings(
        &db.state,
        &alice,
        common::booking_request(&hamlet, 0, &alice, vec![1, 2]),
    )
    .await?;
    booking_service::create_bookings(
        &db.state,
        &bob,
        common::booking_request(&macbeth, 1, &bob, vec![5]),
    )
    .await?;

    let stats = admin_service::stats(&db.state, &admin).await?.data.unwrap();
    assert_eq!(stats.total_shows, 2);
    assert_eq!(stats.total_users, 3);
    assert_eq!(stats.total_bookings, 3);
    assert_eq!(stats.upcoming_showtimes, 3);
    assert_eq!(stats.total_revenue, 2 * 2500 + 1000);

    let ranked: Vec<(Uuid, i64)> = stats
        .bookings_per_show
        .iter()
        .map(|row| (row.movie_id, row.bookings))
        .collect();
    assert_eq!(ranked, vec![(hamlet.id, 2), (macbeth.id, 1)]);

    let err = admin_service::stats(&db.state, &alice).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}

#[tokio::test]
async fn booking_list_filters_by_show() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let admin = common::create_account(&db.state, Role::Admin).await?;
    let alice = common::create_account(&db.state, Role::User).await?;
    let hamlet = common::create_show(&db.state, &admin, 50, &[FUTURE]).await?;
    let macbeth = create_macbeth(&db.state, &admin).await?;

    booking_service::create_bookings(
        &db.state,
        &alice,
        common::booking_request(&hamlet, 0, &alice, vec![1, 2]),
    )
    .await?;
    booking_service::create_bookings(
        &db.state,
        &alice,
        common::booking_request(&macbeth, 1, &alice, vec![3]),
    )
    .await?;

    let all = admin_service::list_bookings(&db.state, &admin, BookingListQuery::default()).await?;
    assert_eq!(all.meta.unwrap().total, Some(3));

    let filtered = admin_service::list_bookings(
        &db.state,
        &admin,
        BookingListQuery {
            show_id: Some(macbeth.id),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(filtered.meta.unwrap().total, Some(1));
    let items = filtered.data.unwrap().items;
    assert_eq!(items.len(), 1);
    assert_eq!((items[0].movie, items[0].seat_number), (macbeth.id, 3));
    Ok(())
}

#[tokio::test]
async fn deleting_a_user_releases_their_seats() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let admin = common::create_account(&db.state, Role::Admin).await?;
    let alice = common::create_account(&db.state, Role::User).await?;
    let bob = common::create_account(&db.state, Role::User).await?;
    let show = common::create_show(&db.state, &admin, 50, &[FUTURE]).await?;

    booking_service::create_bookings(
        &db.state,
        &alice,
        common::booking_request(&show, 0, &alice, vec![1, 2]),
    )
    .await?;
    booking_service::create_bookings(
        &db.state,
        &bob,
        common::booking_request(&show, 0, &bob, vec![3]),
    )
    .await?;

    let deleted = admin_service::delete_user(&db.state, &admin, alice.user_id)
        .await?
        .data
        .unwrap();
    assert_eq!(deleted.id, alice.user_id);
    assert!(Users::find_by_id(alice.user_id).one(&db.state.orm).await?.is_none());
    assert_eq!(Bookings::find().count(&db.state.orm).await?, 1);

    let hydrated = show_service::get_show(&db.state, show.id).await?.data.unwrap();
    assert_eq!(hydrated.show_times[0].available_seats, 49);
    assert_eq!(hydrated.booking_ids.len(), 1);

    // Alice's seats are free again.
    booking_service::create_bookings(
        &db.state,
        &bob,
        common::booking_request(&show, 0, &bob, vec![1]),
    )
    .await?;

    let err = admin_service::delete_user(&db.state, &admin, alice.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("user")));
    Ok(())
}

#[tokio::test]
async fn admin_accounts_are_never_deleted() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let admin = common::create_account(&db.state, Role::Admin).await?;
    let other_admin = common::create_account(&db.state, Role::Admin).await?;
    let user = common::create_account(&db.state, Role::User).await?;

    let err = admin_service::delete_user(&db.state, &admin, other_admin.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert!(Users::find_by_id(other_admin.user_id).one(&db.state.orm).await?.is_some());

    let err = admin_service::delete_user(&db.state, &user, admin.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}
