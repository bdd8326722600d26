//! Integration tests for routecache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    const LIST_ROUTE: &str = r#"import { NextRequest, NextResponse } from 'next/server'
import { createClient } from '@/lib/supabase/server'

export async function GET(request: NextRequest) {
  const supabase = await createClient()
  const { data: teams, error } = await supabase
    .from('teams')
    .select('id, name')
    .order('name')

  if (error) {
    return NextResponse.json({ error: error.message }, { status: 500 })
  }
  return NextResponse.json({ teams })
}
"#;

    const POST_ONLY_ROUTE: &str = r#"import { NextResponse } from 'next/server'

export async function POST() {
  return NextResponse.json({ ok: true })
}
"#;

    const NO_ANCHOR_ROUTE: &str = r#"export async function GET() {
  return Response.json({ ok: true })
}
"#;

    /// Runs the binary with an isolated global config path
    fn routecache(home: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("routecache");
        cmd.env("ROUTECACHE_CONFIG", home.join("global.toml"));
        cmd
    }

    fn write_route(root: &Path, route: &str, content: &str) {
        let path = root.join(route);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let temp = TempDir::new().unwrap();
        write_route(temp.path(), "app/api/teams/route.ts", LIST_ROUTE);
        write_route(temp.path(), "app/api/auth/session/route.ts", LIST_ROUTE);
        write_route(temp.path(), "app/api/tickets/create-ticket/route.ts", POST_ONLY_ROUTE);
        write_route(temp.path(), "app/api/webhooks/route.ts", POST_ONLY_ROUTE);
        temp
    }

    fn read(root: &Path, route: &str) -> String {
        std::fs::read_to_string(root.join(route)).unwrap()
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        routecache(temp.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("caching"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        routecache(temp.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("routecache"));
    }

    #[test]
    fn apply_wraps_list_route() {
        let temp = project();
        routecache(temp.path())
            .args(["apply", "--yes", "--root"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Total routes: 4"))
            .stdout(predicate::str::contains("Routes needing manual caching:"));

        let teams = read(temp.path(), "app/api/teams/route.ts");
        assert!(teams.contains("import { unstable_cache } from 'next/cache'"));
        assert!(teams.contains("import { CACHE_TAGS } from '@/lib/cache'"));
        assert!(teams.contains("await unstable_cache("));
        assert!(teams.contains("['teams']"));
        assert!(teams.contains("{ revalidate: 300, tags: [CACHE_TAGS.teams] }"));

        // Auth routes and POST-only routes are untouched
        assert_eq!(read(temp.path(), "app/api/auth/session/route.ts"), LIST_ROUTE);
        assert_eq!(read(temp.path(), "app/api/webhooks/route.ts"), POST_ONLY_ROUTE);
    }

    #[test]
    fn apply_is_idempotent() {
        let temp = project();
        routecache(temp.path())
            .args(["apply", "-y", "--root"])
            .arg(temp.path())
            .assert()
            .success();
        let first = read(temp.path(), "app/api/teams/route.ts");

        routecache(temp.path())
            .args(["apply", "-y", "--format", "plain", "--root"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("already cached\tapp/api/teams/route.ts"));

        assert_eq!(read(temp.path(), "app/api/teams/route.ts"), first);
        assert_eq!(first.matches("unstable_cache(").count(), 1);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let temp = project();
        routecache(temp.path())
            .args(["apply", "--dry-run", "--root"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("SUMMARY (dry run, no files written)"));

        assert_eq!(read(temp.path(), "app/api/teams/route.ts"), LIST_ROUTE);
    }

    #[test]
    fn json_summary() {
        let temp = project();
        let output = routecache(temp.path())
            .args(["apply", "--dry-run", "--format", "json", "--root"])
            .arg(temp.path())
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["total"], 4);
        assert_eq!(json["counts"]["wrapped"], 1);
        assert_eq!(json["counts"]["excluded"], 2);
        assert_eq!(json["counts"]["no_get_handler"], 1);
        assert_eq!(json["dry_run"], true);
        assert!(json["generated_at"].is_string());
        assert_eq!(json["files"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn manual_list_is_capped() {
        let temp = TempDir::new().unwrap();
        for i in 0..12 {
            write_route(
                temp.path(),
                &format!("app/api/r{:02}/route.ts", i),
                NO_ANCHOR_ROUTE,
            );
        }

        let output = routecache(temp.path())
            .args(["apply", "--dry-run", "--format", "plain", "--root"])
            .arg(temp.path())
            .output()
            .unwrap();
        assert!(output.status.success());

        let stdout = String::from_utf8(output.stdout).unwrap();
        let listed = stdout.lines().filter(|l| l.starts_with("  • ")).count();
        assert_eq!(listed, 10);
        assert!(stdout.contains("Needs manual review: 12"));
        assert!(stdout.contains("  ... and 2 more"));
    }

    #[test]
    fn explicit_missing_path_is_skipped() {
        let temp = project();
        routecache(temp.path())
            .args(["apply", "-y", "--root"])
            .arg(temp.path())
            .args(["app/api/missing/route.ts", "app/api/teams/route.ts"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Total routes: 1"));

        assert!(read(temp.path(), "app/api/teams/route.ts").contains("unstable_cache("));
    }

    #[test]
    fn missing_api_dir_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        routecache(temp.path())
            .args(["apply", "--root"])
            .arg(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("API directory not found"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn local_config_overrides_exclusions() {
        let temp = project();
        std::fs::write(
            temp.path().join(".routecache.toml"),
            "[eligibility]\nexcluded = [\"teams\"]\n",
        )
        .unwrap();

        routecache(temp.path())
            .args(["apply", "-y", "--root"])
            .arg(temp.path())
            .assert()
            .success();

        assert_eq!(read(temp.path(), "app/api/teams/route.ts"), LIST_ROUTE);
    }

    #[test]
    fn invalid_local_config_fails() {
        let temp = project();
        std::fs::write(
            temp.path().join(".routecache.toml"),
            "[policy]\ndefault_revalidate = 0\n",
        )
        .unwrap();

        routecache(temp.path())
            .args(["apply", "--root"])
            .arg(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn policy_shows_table_entry() {
        let temp = TempDir::new().unwrap();
        routecache(temp.path())
            .args(["policy", "--no-local", "app/api/search/tickets/route.ts"])
            .assert()
            .success()
            .stdout(predicate::str::contains("CACHE_TAGS.tickets"))
            .stdout(predicate::str::contains("60s"))
            .stdout(predicate::str::contains("search-tickets"));
    }

    #[test]
    fn policy_plain_unknown_route_uses_defaults() {
        let temp = TempDir::new().unwrap();
        routecache(temp.path())
            .args(["policy", "--no-local", "--format", "plain", "app/api/widgets/route.ts"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "app/api/widgets/route.ts\tgeneral\t300\twidgets",
            ));
    }

    #[test]
    fn init_then_refuse() {
        let temp = TempDir::new().unwrap();
        routecache(temp.path())
            .args(["init", "--path"])
            .arg(temp.path())
            .assert()
            .success();
        assert!(temp.path().join(".routecache.toml").exists());

        routecache(temp.path())
            .args(["init", "--path"])
            .arg(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        routecache(temp.path())
            .args(["config", "path", "--no-local"])
            .assert()
            .success()
            .stdout(predicate::str::contains("global.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        routecache(temp.path())
            .args(["config", "show", "--no-local"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[discovery]"))
            .stdout(predicate::str::contains("api_dir = \"app/api\""));
    }
}
