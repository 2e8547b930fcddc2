mod common;

#[cfg(test)]
mod test_samples {
    use super::common::*;

    use cohortk::subcommands::list_samples::get_sample_names;
    use cohortk_core::{
        checkpoint::{CheckpointName, CheckpointStore, DirCheckpointStore},
        PipelineConfig,
    };

    #[test]
    fn vcf_samples() {
        let ids = get_sample_names(&test_vcf("samples.vcf")).unwrap();
        assert_eq!(ids, SAMPLES);
    }

    #[test]
    fn sample_list() {
        let path = write_lines("samples_list.txt", &["S2\tignored", "", "S1", "S2"]);
        let ids = get_sample_names(&path).unwrap();
        assert_eq!(ids, vec!["S2", "S1"]);
    }

    #[test]
    fn checkpoint_samples() {
        let vcf = test_vcf("samples_checkpoint.vcf");
        let matrix = cohortk::read_vcf::read_vcf_to_matrix(&vcf).unwrap();
        let input = matrix.fingerprint();
        let matrix = matrix.select_columns(&[4, 0]);

        let dir = std::path::Path::new(OUTDIR).join("samples_checkpoint");
        let store = DirCheckpointStore::new(dir).unwrap();
        let path = store
            .write(CheckpointName::Filtered, &PipelineConfig::default(), &input, &matrix)
            .unwrap();

        let ids = get_sample_names(&path).unwrap();
        assert_eq!(ids, vec!["S5", "S1"]);
    }

    #[cfg(feature = "clap")]
    #[test]
    fn run_samples_command() {
        use cohortk::clap::{run_cmd, LogAndVerbosity, SubCommand};

        let cmd = SubCommand::Samples {
            file: test_vcf("samples_cmd.vcf"),
            log_and_verbosity: LogAndVerbosity { verbosity: 1, log_file: None, silent: true },
        };
        run_cmd(cmd).unwrap();
    }
}
