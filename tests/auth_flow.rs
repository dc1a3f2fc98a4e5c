//! Integration tests per registrazione, login, verifica email e reset password

mod common;

#[cfg(test)]
mod auth_tests {
    use super::common::{TEST_PASSWORD, create_test_env, create_verified_user};
    use barter_chat::core::{ErrorKind, TokenPurpose, encode_jwt, require_user};
    use barter_chat::dtos::{SignUpDTO, UpdateProfileDTO};
    use barter_chat::repositories::Read;
    use barter_chat::services::auth;

    fn sign_up_body(email: &str, password: &str) -> SignUpDTO {
        SignUpDTO {
            email: email.to_string(),
            password: password.to_string(),
            name: "Dana".to_string(),
        }
    }

    // ============================================================
    // Registrazione
    // ============================================================

    #[tokio::test]
    async fn test_sign_up_rejects_duplicate_email() {
        let env = create_test_env();
        auth::sign_up(&env.state, sign_up_body("dana@example.com", TEST_PASSWORD))
            .await
            .unwrap();

        // stessa email con maiuscole diverse
        let err = auth::sign_up(&env.state, sign_up_body("Dana@Example.com", TEST_PASSWORD))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.message(), "Email already in use");
    }

    #[tokio::test]
    async fn test_sign_up_validates_input() {
        let env = create_test_env();

        let err = auth::sign_up(&env.state, sign_up_body("not-an-email", TEST_PASSWORD))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let err = auth::sign_up(&env.state, sign_up_body("dana@example.com", "123"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    // ============================================================
    // Login e verifica email
    // ============================================================

    #[tokio::test]
    async fn test_sign_in_requires_verified_email() {
        let env = create_test_env();
        let outcome = auth::sign_up(&env.state, sign_up_body("dana@example.com", TEST_PASSWORD))
            .await
            .unwrap();

        let err = auth::sign_in(&env.state, "dana@example.com", TEST_PASSWORD)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        auth::verify_email(&env.state, &outcome.verification_token)
            .await
            .unwrap();
        let session = auth::sign_in(&env.state, "DANA@example.com", TEST_PASSWORD)
            .await
            .unwrap();
        assert_eq!(session.user.user_id, outcome.user.user_id);

        let me = auth::current_user(&env.state, &session.token).await.unwrap();
        assert_eq!(me.name, "Dana");
    }

    #[tokio::test]
    async fn test_sign_in_with_wrong_credentials() {
        let env = create_test_env();
        create_verified_user(&env.state, "Dana").await;

        for (email, password) in [
            ("dana@example.com", "wrong-password"),
            ("nobody@example.com", TEST_PASSWORD),
            ("dana@example.com", ""),
        ] {
            let err = auth::sign_in(&env.state, email, password).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Unauthorized);
            assert_eq!(err.message(), "Invalid email or password");
        }
    }

    #[tokio::test]
    async fn test_tokens_are_bound_to_their_purpose() {
        let env = create_test_env();
        let outcome = auth::sign_up(&env.state, sign_up_body("dana@example.com", TEST_PASSWORD))
            .await
            .unwrap();

        // un link di verifica non apre una sessione
        let err = auth::current_user(&env.state, &outcome.verification_token)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let err = require_user(&env.state, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let err = auth::current_user(&env.state, "invalid_token_here")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_is_rejected() {
        let env = create_test_env();
        let user = create_verified_user(&env.state, "Dana").await;

        let forged = encode_jwt(&user, TokenPurpose::Session, "another-secret").unwrap();
        let err = auth::current_user(&env.state, &forged).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    // ============================================================
    // Reset password
    // ============================================================

    #[tokio::test]
    async fn test_password_reset_token_is_single_use() {
        let env = create_test_env();
        create_verified_user(&env.state, "Dana").await;

        assert!(
            auth::request_password_reset(&env.state, "nobody@example.com")
                .await
                .unwrap()
                .is_none()
        );
        let token = auth::request_password_reset(&env.state, "dana@example.com")
            .await
            .unwrap()
            .expect("registered email gets a token");

        let err = auth::reset_password(&env.state, &token, "short").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        auth::reset_password(&env.state, &token, "brand-new-pass").await.unwrap();
        let err = auth::reset_password(&env.state, &token, "another-pass").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        assert!(auth::sign_in(&env.state, "dana@example.com", TEST_PASSWORD).await.is_err());
        auth::sign_in(&env.state, "dana@example.com", "brand-new-pass")
            .await
            .unwrap();
    }

    // ============================================================
    // Profilo
    // ============================================================

    #[tokio::test]
    async fn test_update_profile_checks_push_token() {
        let env = create_test_env();
        let user = create_verified_user(&env.state, "Dana").await;

        let err = auth::update_profile(
            &env.state,
            &user,
            UpdateProfileDTO {
                push_token: Some("garbage".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let updated = auth::update_profile(
            &env.state,
            &user,
            UpdateProfileDTO {
                name: Some("  Dana B. ".to_string()),
                push_token: Some("ExpoPushToken[abc123]".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Dana B.");

        let stored = env.state.user.read(&user.user_id).await.unwrap().unwrap();
        assert_eq!(stored.push_token.as_deref(), Some("ExpoPushToken[abc123]"));
    }
}
