//! Integration tests per annunci e proposte di scambio

mod common;

#[cfg(test)]
mod post_tests {
    use super::common::{create_test_env, create_verified_user, post_dto, post_dto_at};
    use barter_chat::core::ErrorKind;
    use barter_chat::entities::GeoPoint;
    use barter_chat::repositories::Read;
    use barter_chat::services::posts::{self, NEARBY_RADIUS_KM};
    use std::collections::HashSet;

    // ============================================================
    // Pubblicazione
    // ============================================================

    #[tokio::test]
    async fn test_create_post_validates_and_assigns_owner() {
        let env = create_test_env();
        let dana = create_verified_user(&env.state, "Dana").await;

        let mut body = post_dto("Guitar", "music", &["books"]);
        body.owner_id = "someone-else".to_string();
        let created = posts::create_post(&env.state, &dana, body, None).await.unwrap();
        assert_eq!(created.post.owner_id, dana.user_id);
        assert_eq!(created.post.views, 0);
        assert!(created.post.model_url.is_empty());
        assert!(created.model_job.is_none());

        let mut invalid = post_dto("Guitar", "music", &["books"]);
        invalid.images.clear();
        let err = posts::create_post(&env.state, &dana, invalid, None)
            .await
            .err()
            .expect("a post without images is rejected");
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let blank_title = post_dto("   ", "music", &["books"]);
        assert!(posts::create_post(&env.state, &dana, blank_title, None).await.is_err());
    }

    #[tokio::test]
    async fn test_model_generation_patches_post_in_background() {
        let env = create_test_env();
        let dana = create_verified_user(&env.state, "Dana").await;

        let created = posts::create_post(
            &env.state,
            &dana,
            post_dto("Lamp", "home", &["books"]),
            Some("file:///tmp/lamp.jpg"),
        )
        .await
        .unwrap();
        created.model_job.expect("model job should start").await.unwrap();

        let post = env.state.post.read(&created.post.post_id).await.unwrap().unwrap();
        assert_eq!(
            post.model_url,
            format!("https://models.test/{}.glb", created.post.post_id)
        );
    }

    #[tokio::test]
    async fn test_model_generation_failure_keeps_post() {
        let env = create_test_env();
        let dana = create_verified_user(&env.state, "Dana").await;
        env.models.set_failing(true);

        let created = posts::create_post(
            &env.state,
            &dana,
            post_dto("Lamp", "home", &["books"]),
            Some("file:///tmp/lamp.jpg"),
        )
        .await
        .unwrap();
        created.model_job.unwrap().await.unwrap();

        let post = env.state.post.read(&created.post.post_id).await.unwrap().unwrap();
        assert!(post.model_url.is_empty());
    }

    // ============================================================
    // Ricerca
    // ============================================================

    #[tokio::test]
    async fn test_category_pages_follow_cursor() {
        let env = create_test_env();
        let dana = create_verified_user(&env.state, "Dana").await;
        for i in 0..13 {
            posts::create_post(&env.state, &dana, post_dto(&format!("Book {}", i), "books", &["music"]), None)
                .await
                .unwrap();
        }
        posts::create_post(&env.state, &dana, post_dto("Drum", "music", &["books"]), None)
            .await
            .unwrap();

        let first = posts::list_by_category(&env.state, "books", None).await.unwrap();
        assert_eq!(first.posts.len(), 10);
        assert!(first.has_more);
        assert_eq!(first.posts[0].title, "Book 12");

        let second = posts::list_by_category(&env.state, "books", first.cursor.as_ref())
            .await
            .unwrap();
        assert_eq!(second.posts.len(), 3);
        assert!(!second.has_more);
        assert_eq!(second.posts.last().unwrap().title, "Book 0");

        let ids: HashSet<&str> = first
            .posts
            .iter()
            .chain(second.posts.iter())
            .map(|p| p.post_id.as_str())
            .collect();
        assert_eq!(ids.len(), 13);
    }

    #[tokio::test]
    async fn test_nearby_sorts_by_distance_and_skips_far_posts() {
        let env = create_test_env();
        let dana = create_verified_user(&env.state, "Dana").await;
        let here = GeoPoint::new(45.0703, 7.6869);

        for (title, point) in [
            ("Far", GeoPoint::new(45.4642, 9.19)),
            ("Close", GeoPoint::new(45.0710, 7.6870)),
            ("Closer", GeoPoint::new(45.0704, 7.6869)),
        ] {
            posts::create_post(&env.state, &dana, post_dto_at(title, "tools", point), None)
                .await
                .unwrap();
        }
        posts::create_post(&env.state, &dana, post_dto("Nowhere", "tools", &["books"]), None)
            .await
            .unwrap();

        let nearby = posts::nearby(&env.state, here, NEARBY_RADIUS_KM).await.unwrap();
        let titles: Vec<&str> = nearby.iter().map(|n| n.post.title.as_str()).collect();
        assert_eq!(titles, vec!["Closer", "Close"]);
        assert!(nearby[0].distance_km <= nearby[1].distance_km);
    }

    #[tokio::test]
    async fn test_exchange_suggestions_capped_and_exclude_post() {
        let env = create_test_env();
        let dana = create_verified_user(&env.state, "Dana").await;
        let eve = create_verified_user(&env.state, "Eve").await;

        let wanted = posts::create_post(&env.state, &dana, post_dto("Camera", "books", &["books", "music"]), None)
            .await
            .unwrap()
            .post;
        for i in 0..4 {
            posts::create_post(&env.state, &eve, post_dto(&format!("Novel {}", i), "books", &["tools"]), None)
                .await
                .unwrap();
        }
        posts::create_post(&env.state, &eve, post_dto("Hammer", "tools", &["books"]), None)
            .await
            .unwrap();

        let suggestions = posts::exchange_suggestions(&env.state, &wanted).await.unwrap();
        assert_eq!(suggestions.len(), posts::MAX_EXCHANGE_SUGGESTIONS);
        assert!(suggestions.iter().all(|p| p.post_id != wanted.post_id));
        assert!(suggestions.iter().all(|p| p.category == "books"));

        let mut no_options = wanted.clone();
        no_options.exchange_options.clear();
        assert!(posts::exchange_suggestions(&env.state, &no_options).await.unwrap().is_empty());
    }

    // ============================================================
    // Interazioni
    // ============================================================

    #[tokio::test]
    async fn test_views_counted_once_per_visitor() {
        let env = create_test_env();
        let dana = create_verified_user(&env.state, "Dana").await;
        let post = posts::create_post(&env.state, &dana, post_dto("Chair", "home", &["books"]), None)
            .await
            .unwrap()
            .post;

        posts::record_view(&env.state, &post.post_id, "visitor-1").await.unwrap();
        posts::record_view(&env.state, &post.post_id, "visitor-1").await.unwrap();
        let viewed = posts::record_view(&env.state, &post.post_id, "visitor-2").await.unwrap();
        assert_eq!(viewed.views, 2);

        let err = posts::record_view(&env.state, "missing", "visitor-1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_like_toggle_keeps_user_and_post_aligned() {
        let env = create_test_env();
        let dana = create_verified_user(&env.state, "Dana").await;
        let eve = create_verified_user(&env.state, "Eve").await;
        let post = posts::create_post(&env.state, &dana, post_dto("Chair", "home", &["books"]), None)
            .await
            .unwrap()
            .post;

        let (liked_post, liked) = posts::toggle_like(&env.state, &eve, &post.post_id).await.unwrap();
        assert!(liked);
        assert_eq!(liked_post.like_count, 1);
        let stored_eve = env.state.user.read(&eve.user_id).await.unwrap().unwrap();
        assert!(stored_eve.liked_posts.contains(&post.post_id));

        let (unliked_post, liked) = posts::toggle_like(&env.state, &eve, &post.post_id).await.unwrap();
        assert!(!liked);
        assert_eq!(unliked_post.like_count, 0);
        let stored_eve = env.state.user.read(&eve.user_id).await.unwrap().unwrap();
        assert!(stored_eve.liked_posts.is_empty());

        let err = posts::toggle_like(&env.state, &eve, "missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_authenticity_check() {
        let env = create_test_env();
        let report = posts::check_authenticity(&env.state, "https://img.test/chair.jpg")
            .await
            .unwrap();
        assert_eq!(report.filename, "chair.jpg");
        assert!(report.result.percentage < 50.0);

        let err = posts::check_authenticity(&env.state, "  ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }
}

#[cfg(test)]
mod offer_tests {
    use super::common::{create_reachable_user, create_test_env, create_verified_user, post_dto};
    use barter_chat::core::ErrorKind;
    use barter_chat::dtos::OfferDecision;
    use barter_chat::entities::{OfferStatus, Post, User};
    use barter_chat::services::{offers, posts};
    use barter_chat::AppState;
    use std::sync::Arc;

    async fn publish(state: &Arc<AppState>, owner: &User, title: &str) -> Post {
        posts::create_post(state, owner, post_dto(title, "books", &["music"]), None)
            .await
            .unwrap()
            .post
    }

    // ============================================================
    // Proposte
    // ============================================================

    #[tokio::test]
    async fn test_propose_notifies_owner() {
        let env = create_test_env();
        let owner = create_reachable_user(&env.state, "Owen").await;
        let offerer = create_verified_user(&env.state, "Fiona").await;
        let wanted = publish(&env.state, &owner, "Vinyl").await;
        let mine = publish(&env.state, &offerer, "Atlas").await;

        let offer = offers::propose(&env.state, &offerer, &wanted.post_id, &mine.post_id)
            .await
            .unwrap();
        assert_eq!(offer.status, OfferStatus::Pending);
        assert_eq!(offer.post_owner_id, owner.user_id);

        let sent = env.relay.wait_for(1).await;
        assert_eq!(sent[0].title, "Fiona");
        assert_eq!(sent[0].body, "Offer you a deal for your post Vinyl");

        let received = offers::received(&env.state, &owner.user_id).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].post.as_ref().unwrap().title, "Vinyl");
        assert_eq!(received[0].offered_post.as_ref().unwrap().title, "Atlas");

        let sent_offers = offers::sent(&env.state, &offerer.user_id).await.unwrap();
        assert_eq!(sent_offers.len(), 1);
        assert!(offers::sent(&env.state, &owner.user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_propose_rejects_invalid_pairs() {
        let env = create_test_env();
        let owner = create_verified_user(&env.state, "Owen").await;
        let offerer = create_verified_user(&env.state, "Fiona").await;
        let wanted = publish(&env.state, &owner, "Vinyl").await;
        let mine = publish(&env.state, &offerer, "Atlas").await;

        // post altrui offerto come proprio
        let err = offers::propose(&env.state, &offerer, &wanted.post_id, &wanted.post_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        // proposta sul proprio post
        let err = offers::propose(&env.state, &owner, &wanted.post_id, &wanted.post_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let err = offers::propose(&env.state, &offerer, "missing", &mine.post_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        offers::propose(&env.state, &offerer, &wanted.post_id, &mine.post_id)
            .await
            .unwrap();
        let err = offers::propose(&env.state, &offerer, &wanted.post_id, &mine.post_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    // ============================================================
    // Risposte
    // ============================================================

    #[tokio::test]
    async fn test_offer_resolves_only_once() {
        let env = create_test_env();
        let owner = create_verified_user(&env.state, "Owen").await;
        let offerer = create_reachable_user(&env.state, "Fiona").await;
        let wanted = publish(&env.state, &owner, "Vinyl").await;
        let mine = publish(&env.state, &offerer, "Atlas").await;
        let offer = offers::propose(&env.state, &offerer, &wanted.post_id, &mine.post_id)
            .await
            .unwrap();

        let err = offers::respond(&env.state, &offerer, &offer.offer_id, OfferDecision::Accept)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let accepted = offers::respond(&env.state, &owner, &offer.offer_id, OfferDecision::Accept)
            .await
            .unwrap();
        assert_eq!(accepted.status, OfferStatus::Accepted);

        let sent = env.relay.wait_for(1).await;
        assert_eq!(sent[0].title, "Accepted");
        assert_eq!(sent[0].body, "Your offer has been accepted");

        let err = offers::respond(&env.state, &owner, &offer.offer_id, OfferDecision::Decline)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.message(), "Offer is already processed");

        // dopo la risposta si può proporre di nuovo la stessa coppia
        offers::propose(&env.state, &offerer, &wanted.post_id, &mine.post_id)
            .await
            .unwrap();

        let err = offers::respond(&env.state, &owner, "missing", OfferDecision::Decline)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
