pub mod backups;
pub mod entries;
pub mod init;
pub mod run;
pub mod subplugins;
