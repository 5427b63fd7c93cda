//! End-to-end checks of the upload and content limits of a form.

use admission::{
    AdmissionError, FormConfiguration, InMemoryRepository, UploadAdmissionController,
    ViolationKind,
};

fn repository() -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    repo.create_folder("/").expect("root folder");
    repo
}

fn base_config() -> FormConfiguration {
    FormConfiguration::new("/")
        .with_resource_type("plain")
        .with_name_pattern("n_%(number)")
        .with_locale("en")
}

#[test]
fn uploads_without_upload_folder_are_refused() {
    let controller = UploadAdmissionController::new(repository());
    let config = base_config()
        .with_max_content_count(100)
        .with_allowed_extensions([".jpg", ".PNG"]);

    let err = controller
        .check_create_upload(&config, "foo.png", 100)
        .expect_err("uploads are disabled");
    assert_eq!(err.kind(), Some(ViolationKind::NoUploadsAllowed));
    assert_eq!(err.message_key(), "no_uploads_allowed");
}

#[test]
fn configured_limits_are_enforced() {
    let repo = repository();
    repo.create_folder("/uploads/").expect("upload folder");
    let controller = UploadAdmissionController::new(repo);

    let config = base_config()
        .with_upload_folder("/uploads/")
        .with_max_upload_size(10000)
        .with_max_content_count(0)
        .with_allowed_extensions([".jpg", ".PNG"]);

    assert_eq!(
        controller.check_create_upload(&config, "foo.png", 50000),
        Err(AdmissionError::UploadTooBig { max_size: 10000 })
    );
    controller
        .check_create_upload(&config, "foo.png", 3)
        .expect("small png is allowed");

    let err = controller
        .check_create_upload(&config, "foo.doc", 100)
        .expect_err("doc is not in the allow-list");
    assert_eq!(err.kind(), Some(ViolationKind::ExtensionNotAllowed));

    controller
        .check_create_upload(&config, "foo.JPG", 100)
        .expect("extension match ignores case");

    assert_eq!(
        controller.check_create_content(&config),
        Err(AdmissionError::TooManyContents { max_count: 0 })
    );

    let roomier = base_config()
        .with_upload_folder("/uploads/")
        .with_max_content_count(100)
        .with_allowed_extensions([".jpg", ".PNG"]);
    controller
        .check_create_content(&roomier)
        .expect("empty folder is below 100 items");
}

#[test]
fn no_limits_admit_anything() {
    let repo = repository();
    repo.create_folder("/uploads2/").expect("upload folder");
    let controller = UploadAdmissionController::new(repo);

    let config = base_config().with_upload_folder("/uploads2/");

    controller
        .check_create_upload(&config, "foo.aasdfasdfasdf", 99_999_999)
        .expect("no limits configured");
    controller
        .check_create_upload(&config, "no-extension", u64::MAX)
        .expect("no allow-list configured");
    controller
        .check_create_content(&config)
        .expect("no content limit configured");
}

#[test]
fn upload_count_tracks_repository_state() {
    let repo = repository();
    repo.create_folder("/uploads/").expect("upload folder");
    let controller = UploadAdmissionController::new(repo);
    let config = base_config()
        .with_upload_folder("/uploads/")
        .with_max_upload_count(2);

    for name in ["a.png", "b.png"] {
        controller
            .check_create_upload(&config, name, 1)
            .expect("below the upload limit");
        controller
            .repository()
            .add_child("/uploads/", name)
            .expect("store upload");
    }

    assert_eq!(
        controller.check_create_upload(&config, "c.png", 1),
        Err(AdmissionError::TooManyUploads { max_count: 2 })
    );
}

#[test]
fn new_content_names_follow_the_pattern() {
    let repo = repository();
    let controller = UploadAdmissionController::new(repo);
    let config = base_config().with_max_content_count(3);
    let pattern = config.content_name_pattern().expect("valid pattern");

    let mut created = Vec::new();
    while controller.check_create_content(&config).is_ok() {
        let name = pattern
            .next_name(controller.repository(), &config.target_folder)
            .expect("free name");
        controller
            .repository()
            .add_child(config.target_folder.clone(), name.clone())
            .expect("store content");
        created.push(name);
    }

    assert_eq!(created, vec!["n_00001", "n_00002", "n_00003"]);
}

#[test]
fn missing_folder_surfaces_as_infrastructure_error() {
    let controller = UploadAdmissionController::new(repository());
    let config = base_config()
        .with_upload_folder("/not-created/")
        .with_max_upload_count(1);

    let err = controller
        .check_create_upload(&config, "a.png", 1)
        .expect_err("folder lookup fails");
    assert!(matches!(err, AdmissionError::Repository(_)));
    assert!(!err.is_policy_violation());
}
