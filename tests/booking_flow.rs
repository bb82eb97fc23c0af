mod common;

use sea_orm::{EntityTrait, PaginatorTrait};
use theater_booking_api::{
    dto::bookings::{CreateBookingRequest, OccupiedSeatsQuery},
    entity::{Bookings, Users},
    error::AppError,
    middleware::auth::Role,
    models::uuid_list,
    routes::params::Pagination,
    services::{booking_service, show_service},
};
use uuid::Uuid;

#[tokio::test]
async fn user_books_seats_and_sees_them() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let admin = common::create_account(&db.state, Role::Admin).await?;
    let user = common::create_account(&db.state, Role::User).await?;
    let show = common::create_show(&db.state, &admin, 50, &["2026-12-01T19:00:00Z"]).await?;

    let resp = booking_service::create_bookings(
        &db.state,
        &user,
        common::booking_request(&show, 0, &user, vec![12, 13]),
    )
    .await?;
    let bookings = resp.data.unwrap().bookings;
    assert_eq!(bookings.len(), 2);
    assert!(bookings.iter().all(|b| b.price == 2500 && b.user == user.user_id));

    let occupied = booking_service::occupied_seats(
        &db.state,
        OccupiedSeatsQuery {
            movie_id: Some(show.id.to_string()),
            show_time_id: Some(show.show_times[0].id.to_string()),
        },
    )
    .await?;
    assert_eq!(occupied.data.unwrap().occupied_seats, vec![12, 13]);

    let mine = booking_service::list_my_bookings(&db.state, &user, Pagination::default()).await?;
    assert_eq!(mine.data.unwrap().items.len(), 2);
    assert_eq!(mine.meta.unwrap().total, Some(2));

    let stored = Users::find_by_id(user.user_id).one(&db.state.orm).await?.unwrap();
    assert_eq!(uuid_list(&stored.booking_ids).len(), 2);

    let hydrated = show_service::get_show(&db.state, show.id).await?.data.unwrap();
    assert_eq!(hydrated.show_times[0].available_seats, 48);
    Ok(())
}

#[tokio::test]
async fn admins_cannot_book() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let admin = common::create_account(&db.state, Role::Admin).await?;
    let show = common::create_show(&db.state, &admin, 50, &["2026-12-01T19:00:00Z"]).await?;

    let err = booking_service::create_bookings(
        &db.state,
        &admin,
        common::booking_request(&show, 0, &admin, vec![1]),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Forbidden));
    assert_eq!(Bookings::find().count(&db.state.orm).await?, 0);
    Ok(())
}

#[tokio::test]
async fn missing_fields_are_reported_together() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let user = common::create_account(&db.state, Role::User).await?;

    let err = booking_service::create_bookings(
        &db.state,
        &user,
        CreateBookingRequest {
            movie: Some(Uuid::new_v4().to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();

    match err {
        AppError::MissingFields(fields) => {
            assert_eq!(fields, vec!["date", "seatNumbers", "user", "showTimeId"])
        }
        other => panic!("expected missing fields, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn booking_for_someone_else_is_forbidden() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let admin = common::create_account(&db.state, Role::Admin).await?;
    let alice = common::create_account(&db.state, Role::User).await?;
    let bob = common::create_account(&db.state, Role::User).await?;
    let show = common::create_show(&db.state, &admin, 50, &["2026-12-01T19:00:00Z"]).await?;

    let err = booking_service::create_bookings(
        &db.state,
        &alice,
        common::booking_request(&show, 0, &bob, vec![1]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}

#[tokio::test]
async fn unknown_movie_and_foreign_showtime_are_not_found() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let admin = common::create_account(&db.state, Role::Admin).await?;
    let user = common::create_account(&db.state, Role::User).await?;
    let show = common::create_show(&db.state, &admin, 50, &["2026-12-01T19:00:00Z"]).await?;
    let other = common::create_show(&db.state, &admin, 50, &["2026-12-05T19:00:00Z"]).await?;

    let mut request = common::booking_request(&show, 0, &user, vec![1]);
    request.movie = Some(Uuid::new_v4().to_string());
    let err = booking_service::create_bookings(&db.state, &user, request)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("movie")));

    let mut request = common::booking_request(&show, 0, &user, vec![1]);
    request.show_time_id = Some(other.show_times[0].id.to_string());
    let err = booking_service::create_bookings(&db.state, &user, request)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("showtime")));

    assert_eq!(Bookings::find().count(&db.state.orm).await?, 0);
    Ok(())
}

#[tokio::test]
async fn seat_beyond_capacity_is_rejected() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let admin = common::create_account(&db.state, Role::Admin).await?;
    let user = common::create_account(&db.state, Role::User).await?;
    let show = common::create_show(&db.state, &admin, 10, &["2026-12-01T19:00:00Z"]).await?;

    let err = booking_service::create_bookings(
        &db.state,
        &user,
        common::booking_request(&show, 0, &user, vec![10, 11]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(Bookings::find().count(&db.state.orm).await?, 0);
    Ok(())
}

#[tokio::test]
async fn two_users_racing_for_one_seat() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let admin = common::create_account(&db.state, Role::Admin).await?;
    let alice = common::create_account(&db.state, Role::User).await?;
    let bob = common::create_account(&db.state, Role::User).await?;
    let show = common::create_show(&db.state, &admin, 50, &["2026-12-01T19:00:00Z"]).await?;

    let (a, b) = tokio::join!(
        booking_service::create_bookings(
            &db.state,
            &alice,
            common::booking_request(&show, 0, &alice, vec![12]),
        ),
        booking_service::create_bookings(
            &db.state,
            &bob,
            common::booking_request(&show, 0, &bob, vec![12]),
        ),
    );

    let outcomes = [a.is_ok(), b.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(AppError::SeatAlreadyBooked(12))));
    assert_eq!(Bookings::find().count(&db.state.orm).await?, 1);
    Ok(())
}

#[tokio::test]
async fn a_taken_seat_rolls_back_the_whole_request() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let admin = common::create_account(&db.state, Role::Admin).await?;
    let alice = common::create_account(&db.state, Role::User).await?;
    let bob = common::create_account(&db.state, Role::User).await?;
    let show = common::create_show(&db.state, &admin, 50, &["2026-12-01T19:00:00Z"]).await?;

    booking_service::create_bookings(
        &db.state,
        &alice,
        common::booking_request(&show, 0, &alice, vec![5]),
    )
    .await?;

    let err = booking_service::create_bookings(
        &db.state,
        &bob,
        common::booking_request(&show, 0, &bob, vec![4, 5, 6]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::SeatAlreadyBooked(5)));

    let occupied = booking_service::occupied_seats(
        &db.state,
        OccupiedSeatsQuery {
            movie_id: Some(show.id.to_string()),
            show_time_id: Some(show.show_times[0].id.to_string()),
        },
    )
    .await?;
    assert_eq!(occupied.data.unwrap().occupied_seats, vec![5]);

    let stored = Users::find_by_id(bob.user_id).one(&db.state.orm).await?.unwrap();
    assert!(uuid_list(&stored.booking_ids).is_empty());
    Ok(())
}

#[tokio::test]
async fn occupied_seats_requires_both_ids() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let err = booking_service::occupied_seats(
        &db.state,
        OccupiedSeatsQuery {
            movie_id: None,
            show_time_id: Some(Uuid::new_v4().to_string()),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::MissingFields(ref f) if f == &vec!["movieId"]));
    Ok(())
}

#[tokio::test]
async fn only_the_owner_or_an_admin_cancels() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let admin = common::create_account(&db.state, Role::Admin).await?;
    let alice = common::create_account(&db.state, Role::User).await?;
    let bob = common::create_account(&db.state, Role::User).await?;
    let show = common::create_show(&db.state, &admin, 50, &["2026-12-01T19:00:00Z"]).await?;

    let created = booking_service::create_bookings(
        &db.state,
        &alice,
        common::booking_request(&show, 0, &alice, vec![1, 2]),
    )
    .await?
    .data
    .unwrap()
    .bookings;

    let err = booking_service::cancel_booking(&db.state, &bob, created[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    booking_service::cancel_booking(&db.state, &alice, created[0].id).await?;
    booking_service::cancel_booking(&db.state, &admin, created[1].id).await?;
    assert_eq!(Bookings::find().count(&db.state.orm).await?, 0);

    let err = booking_service::cancel_booking(&db.state, &alice, created[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("booking")));
    Ok(())
}

#[tokio::test]
async fn booking_date_is_taken_from_the_showtime() -> anyhow::Result<()> {
    let db = common::setup().await?;
    let admin = common::create_account(&db.state, Role::Admin).await?;
    let user = common::create_account(&db.state, Role::User).await?;
    let show = common::create_show(&db.state, &admin, 50, &["2026-12-01T19:00:00Z"]).await?;

    let mut request = common::booking_request(&show, 0, &user, vec![3]);
    request.date = Some("2030-01-01".into());
    let created = booking_service::create_bookings(&db.state, &user, request)
        .await?
        .data
        .unwrap()
        .bookings;
    assert_eq!(created[0].date, show.show_times[0].date);

    let mine = booking_service::list_my_bookings(&db.state, &user, Pagination::default()).await?;
    assert_eq!(mine.data.unwrap().items[0].date, show.show_times[0].date);

    // The field is still required to parse.
    let mut request = common::booking_request(&show, 0, &user, vec![4]);
    request.date = Some("next tuesday".into());
    let err = booking_service::create_bookings(&db.state, &user, request)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    Ok(())
}
