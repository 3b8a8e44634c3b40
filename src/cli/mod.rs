//! Command-line interface definitions for the `rename-pvc` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `rename-pvc` binary.
#[derive(Debug, Parser)]
#[command(
    name = "rename-pvc",
    version,
    about = "Rename a PersistentVolumeClaim without losing its data",
    long_about = "Rename a PersistentVolumeClaim by creating a copy under the new name, \
                  moving the bound PersistentVolume over to it, and deleting the old claim \
                  once the copy is bound. The volume's reclaim policy must keep the data \
                  when the old claim is deleted."
)]
pub(crate) struct Cli {
    /// Name of the claim to rename.
    #[arg(value_name = "SOURCE")]
    pub(crate) source: String,
    /// New name for the claim.
    #[arg(value_name = "TARGET")]
    pub(crate) target: String,
    /// Skip the confirmation prompt.
    #[arg(short = 'y', long)]
    pub(crate) yes: bool,
    /// Namespace of the source claim.
    ///
    /// Defaults to the namespace of the selected kubeconfig context.
    #[arg(short = 'n', long, value_name = "NS")]
    pub(crate) namespace: Option<String>,
    /// Namespace to create the new claim in.
    ///
    /// Defaults to the source namespace.
    #[arg(short = 'N', long, value_name = "NS")]
    pub(crate) target_namespace: Option<String>,
    /// Path to the kubeconfig file to use.
    #[arg(long, value_name = "PATH")]
    pub(crate) kubeconfig: Option<String>,
    /// Name of the kubeconfig context to use.
    #[arg(long, value_name = "NAME")]
    pub(crate) context: Option<String>,
}
