use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("comments-tree").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env_remove("COMMENTS_TREE_DATA_DIR")
        .arg("--no-color")
        .arg("--data-dir")
        .arg(dir.path().join("data"));
    cmd
}

#[test]
fn test_help() {
    Command::cargo_bin("comments-tree")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("post"))
        .stdout(predicate::str::contains("tree"));
}

#[test]
fn test_post_and_print_tree() {
    let dir = TempDir::new().unwrap();

    cli(&dir)
        .args(["post", "First!", "--on", "blog.article", "--object", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Posted comment 2"));

    cli(&dir)
        .args(["post", "Welcome", "--parent", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("level 2"));

    cli(&dir)
        .args(["tree", "blog.article", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#2 First!"))
        .stdout(predicate::str::contains("  #3 Welcome"));

    cli(&dir)
        .args(["tree", "blog.article", "1", "--flat", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"parent_id\": 2"));
}

#[test]
fn test_root_is_idempotent() {
    let dir = TempDir::new().unwrap();

    let first = cli(&dir)
        .args(["root", "blog.article", "9"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    cli(&dir)
        .args(["root", "blog.article", "9"])
        .assert()
        .success()
        .stdout(predicate::eq(first.as_slice()));
}

#[test]
fn test_thread_level_limit_from_config() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".comments-tree")).unwrap();
    std::fs::write(
        dir.path().join(".comments-tree/config.toml"),
        "[threads]\nmax_thread_level = 2\n",
    )
    .unwrap();

    cli(&dir)
        .args(["post", "top", "--on", "blog.article", "--object", "1"])
        .assert()
        .success();
    cli(&dir)
        .args(["post", "reply", "--parent", "2"])
        .assert()
        .success();
    cli(&dir)
        .args(["post", "too deep", "--parent", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("thread level"));
}

#[test]
fn test_count_and_moderation() {
    let dir = TempDir::new().unwrap();

    for (label, object) in [("blog.article", "1"), ("blog.article", "2"), ("blog.diary", "1")] {
        cli(&dir)
            .args(["post", "hi", "--on", label, "--object", object])
            .assert()
            .success();
    }

    cli(&dir)
        .args(["count", "blog.article", "blog.diary"])
        .assert()
        .success()
        .stdout("3\n");

    cli(&dir)
        .args(["post", "pending", "--on", "blog.diary", "--object", "1", "--private"])
        .assert()
        .success();
    cli(&dir)
        .args(["moderate", "pending"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pending"));

    cli(&dir)
        .args(["moderate", "flag", "2", "delete"])
        .assert()
        .success();
    cli(&dir)
        .args(["tree", "blog.article", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No comments"));

    cli(&dir)
        .args(["moderate", "flag", "2", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown flag"));
}

#[test]
fn test_flags_are_recorded_once_per_user() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["post", "hi", "--on", "blog.article", "--object", "1"])
        .assert()
        .success();

    for user in ["alice", "bob"] {
        cli(&dir)
            .args(["moderate", "flag", "2", "like", "--user", user])
            .assert()
            .success()
            .stdout(predicate::str::contains("0 changed"));
    }
    cli(&dir)
        .args(["moderate", "flag", "2", "like", "--user", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Flag already raised"));

    cli(&dir)
        .args(["moderate", "flags", "2", "like"])
        .assert()
        .success()
        .stdout(predicate::str::contains("I liked it on comment 2: 2"))
        .stdout(predicate::str::contains("  alice"))
        .stdout(predicate::str::contains("  bob"));
}

#[test]
fn test_empty_flat_tree_json() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["tree", "blog.article", "9", "--flat", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"comments\": []"));

    cli(&dir)
        .args(["tree", "blog.article", "9", "--json"])
        .assert()
        .success()
        .stdout("[]\n");
}

#[test]
fn test_invalid_content_type() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["tree", "article", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid content type"));
}

#[test]
fn test_config_init_and_show() {
    let dir = TempDir::new().unwrap();

    cli(&dir).args(["config", "init"]).assert().success();
    assert!(dir.path().join(".comments-tree/config.toml").exists());

    cli(&dir)
        .args(["config", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"max_thread_level\": 3"));
}
