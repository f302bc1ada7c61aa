//! CLI argument parsing tests (via clap `try_parse_from`).

// The CLI is a binary crate, so clap parsing is validated on a mirrored
// struct, as the driver's own definition is not importable from here.

mod clap_parsing {
    use std::path::PathBuf;

    use clap::{Parser, Subcommand};

    #[derive(Parser)]
    #[command(name = "ashs-sched")]
    struct TestCli {
        #[arg(short = 'S', long = "slurm", global = true)]
        use_slurm: bool,

        #[arg(short = 'Q', long = "sge", global = true)]
        use_sge: bool,

        #[arg(short = 'l', long = "lsf", global = true)]
        use_lsf: bool,

        #[arg(short = 'P', long = "parallel", global = true)]
        use_parallel: bool,

        #[arg(short = 'c', long = "config", global = true)]
        config: Option<PathBuf>,

        #[arg(short, long, action = clap::ArgAction::Count, global = true)]
        verbose: u8,

        #[command(subcommand)]
        command: TestCommands,
    }

    #[derive(Subcommand)]
    enum TestCommands {
        Detect,
        Submit {
            #[arg(long, default_value = "0")]
            stage: u32,
            #[arg(long)]
            name: Option<String>,
            #[arg(long)]
            sync: bool,
            script: PathBuf,
            #[arg(trailing_var_arg = true)]
            args: Vec<String>,
        },
        Array {
            #[arg(long, default_value = "0")]
            stage: u32,
            #[arg(long)]
            name: String,
            #[arg(long)]
            values: String,
            #[arg(long)]
            inner: Option<String>,
            script: PathBuf,
            #[arg(trailing_var_arg = true)]
            args: Vec<String>,
        },
        Wait {
            ids: Vec<String>,
        },
        Slots,
    }

    #[test]
    fn test_parse_detect() {
        let cli = TestCli::try_parse_from(["ashs-sched", "detect"]).unwrap();
        assert!(matches!(cli.command, TestCommands::Detect));
        assert!(!cli.use_slurm);
    }

    #[test]
    fn test_parse_selector_flags() {
        let cli = TestCli::try_parse_from(["ashs-sched", "-S", "detect"]).unwrap();
        assert!(cli.use_slurm);

        let cli = TestCli::try_parse_from(["ashs-sched", "-Q", "detect"]).unwrap();
        assert!(cli.use_sge);

        let cli = TestCli::try_parse_from(["ashs-sched", "-l", "detect"]).unwrap();
        assert!(cli.use_lsf);

        let cli = TestCli::try_parse_from(["ashs-sched", "-P", "detect"]).unwrap();
        assert!(cli.use_parallel);
    }

    #[test]
    fn test_parse_submit_minimal() {
        let cli = TestCli::try_parse_from(["ashs-sched", "submit", "run.sh"]).unwrap();
        match cli.command {
            TestCommands::Submit {
                stage,
                name,
                sync,
                script,
                args,
            } => {
                assert_eq!(stage, 0);
                assert!(name.is_none());
                assert!(!sync);
                assert_eq!(script, PathBuf::from("run.sh"));
                assert!(args.is_empty());
            }
            _ => panic!("Expected Submit command"),
        }
    }

    #[test]
    fn test_parse_submit_with_stage_and_args() {
        let cli = TestCli::try_parse_from([
            "ashs-sched",
            "submit",
            "--stage",
            "2",
            "--name",
            "reg",
            "--sync",
            "run.sh",
            "left",
            "right",
        ])
        .unwrap();
        match cli.command {
            TestCommands::Submit {
                stage,
                name,
                sync,
                args,
                ..
            } => {
                assert_eq!(stage, 2);
                assert_eq!(name.unwrap(), "reg");
                assert!(sync);
                assert_eq!(args, vec!["left", "right"]);
            }
            _ => panic!("Expected Submit command"),
        }
    }

    #[test]
    fn test_parse_array_one_dimensional() {
        let cli = TestCli::try_parse_from([
            "ashs-sched",
            "array",
            "--name",
            "seg",
            "--values",
            "1 2 3",
            "run.sh",
        ])
        .unwrap();
        match cli.command {
            TestCommands::Array {
                name,
                values,
                inner,
                ..
            } => {
                assert_eq!(name, "seg");
                assert_eq!(values, "1 2 3");
                assert!(inner.is_none());
            }
            _ => panic!("Expected Array command"),
        }
    }

    #[test]
    fn test_parse_array_two_dimensional() {
        let cli = TestCli::try_parse_from([
            "ashs-sched",
            "array",
            "--name",
            "grid",
            "--values",
            "a b",
            "--inner",
            "1 2",
            "run.sh",
        ])
        .unwrap();
        match cli.command {
            TestCommands::Array { inner, .. } => {
                assert_eq!(inner.unwrap(), "1 2");
            }
            _ => panic!("Expected Array command"),
        }
    }

    #[test]
    fn test_parse_array_requires_name_and_values() {
        assert!(TestCli::try_parse_from(["ashs-sched", "array", "run.sh"]).is_err());
    }

    #[test]
    fn test_parse_wait_ids() {
        let cli = TestCli::try_parse_from(["ashs-sched", "wait", "11", "12"]).unwrap();
        match cli.command {
            TestCommands::Wait { ids } => assert_eq!(ids, vec!["11", "12"]),
            _ => panic!("Expected Wait command"),
        }
    }

    #[test]
    fn test_parse_verbose_counts() {
        let cli = TestCli::try_parse_from(["ashs-sched", "-vv", "slots"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_no_subcommand() {
        assert!(TestCli::try_parse_from(["ashs-sched"]).is_err());
    }
}
