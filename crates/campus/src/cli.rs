//! Clap derive structures for the `campus` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// campus -- school administration from the command line
#[derive(Debug, Parser)]
#[command(
    name = "campus",
    version,
    about = "Manage students, teachers, subjects and sections",
    long_about = "A command-line client for the campus school-administration API.\n\n\
        Log in once per profile; the bearer credential is kept in the system\n\
        keyring (or a private file) and checked before every command.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "CAMPUS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API root URL (overrides profile)
    #[arg(long, short = 'u', env = "CAMPUS_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CAMPUS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "CAMPUS_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "CAMPUS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the credential for this profile
    Login(LoginArgs),

    /// Create an account and log in with it
    Register(RegisterArgs),

    /// Forget the stored credential
    Logout,

    /// Show who the stored credential belongs to
    Whoami,

    /// Inspect or supervise the current session
    Session(SessionArgs),

    /// Count students, teachers, subjects and sections
    #[command(alias = "dash")]
    Dashboard(DashboardArgs),

    /// Manage students
    #[command(alias = "st")]
    Students(StudentsArgs),

    /// Manage teachers
    #[command(alias = "te")]
    Teachers(TeachersArgs),

    /// Manage subjects
    #[command(alias = "su")]
    Subjects(SubjectsArgs),

    /// Manage sections, their subject assignments and enrollments
    #[command(alias = "se")]
    Sections(SectionsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Authentication ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email (prompted if omitted)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Account password (prompted if omitted)
    #[arg(long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Display name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Account email
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Account password (prompted if omitted)
    #[arg(long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Print the decoded session
    Show,

    /// Keep checking the session until it ends or Ctrl-C is pressed
    Watch,
}

// ── Shared List Arguments ────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// Only count records of this school year (e.g. 2024-2025)
    #[arg(long)]
    pub school_year: Option<String>,
}

/// Pagination and search shared by every list command.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Page number (1-based)
    #[arg(long)]
    pub page: Option<u32>,

    /// Max results per page
    #[arg(long, short = 'l')]
    pub limit: Option<u32>,

    /// Free-text search
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Filter by school year (e.g. 2024-2025)
    #[arg(long)]
    pub school_year: Option<String>,
}

// ── Students ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StudentsArgs {
    #[command(subcommand)]
    pub command: StudentsCommand,
}

#[derive(Debug, Subcommand)]
pub enum StudentsCommand {
    /// List students
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Filter by grade
        #[arg(long)]
        grade: Option<String>,

        /// Filter by section name
        #[arg(long)]
        section: Option<String>,
    },

    /// Show one student
    Get {
        /// Student ID
        id: String,
    },

    /// Create a student
    Create {
        #[command(flatten)]
        fields: StudentFields,

        /// Create from JSON file (overrides individual flags)
        #[arg(long, short = 'F', conflicts_with_all = &["first_name", "last_name"])]
        from_file: Option<PathBuf>,
    },

    /// Update a student
    Update {
        /// Student ID
        id: String,

        #[command(flatten)]
        fields: StudentFields,

        /// Load the update payload from a JSON file
        #[arg(long, short = 'F')]
        from_file: Option<PathBuf>,
    },

    /// Delete a student
    #[command(alias = "rm")]
    Delete {
        /// Student ID
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct StudentFields {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub middle_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub gender: Option<String>,
    #[arg(long)]
    pub age: Option<u32>,
    #[arg(long)]
    pub grade: Option<String>,
    #[arg(long)]
    pub section: Option<String>,
    #[arg(long)]
    pub school_year: Option<String>,
}

// ── Teachers ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TeachersArgs {
    #[command(subcommand)]
    pub command: TeachersCommand,
}

#[derive(Debug, Subcommand)]
pub enum TeachersCommand {
    /// List teachers
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Filter by department
        #[arg(long)]
        department: Option<String>,
    },

    /// Show one teacher
    Get {
        /// Teacher ID
        id: String,
    },

    /// Create a teacher
    Create {
        #[command(flatten)]
        fields: TeacherFields,

        /// Create from JSON file (overrides individual flags)
        #[arg(
            long,
            short = 'F',
            conflicts_with_all = &["first_name", "last_name", "email"]
        )]
        from_file: Option<PathBuf>,
    },

    /// Update a teacher
    Update {
        /// Teacher ID
        id: String,

        #[command(flatten)]
        fields: TeacherFields,

        /// Load the update payload from a JSON file
        #[arg(long, short = 'F')]
        from_file: Option<PathBuf>,
    },

    /// Delete a teacher
    #[command(alias = "rm")]
    Delete {
        /// Teacher ID
        id: String,
    },

    /// Assign subjects to a teacher for one school year
    AssignSubjects {
        /// Teacher ID
        id: String,

        /// Subject IDs (repeat or comma-separate)
        #[arg(long = "subject", required = true, value_delimiter = ',')]
        subjects: Vec<String>,

        /// School year the assignment applies to
        #[arg(long)]
        school_year: String,
    },

    /// List the subjects a teacher holds
    Subjects {
        /// Teacher ID
        id: String,

        /// Restrict to one school year
        #[arg(long)]
        school_year: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct TeacherFields {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone_number: Option<String>,
    #[arg(long)]
    pub department: Option<String>,
    #[arg(long)]
    pub qualification: Option<String>,
    #[arg(long)]
    pub years_of_experience: Option<u32>,
    #[arg(long)]
    pub school_year: Option<String>,
}

// ── Subjects ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SubjectsArgs {
    #[command(subcommand)]
    pub command: SubjectsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SubjectsCommand {
    /// List subjects
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Filter by department
        #[arg(long)]
        department: Option<String>,
    },

    /// Show one subject
    Get {
        /// Subject ID
        id: String,
    },

    /// Create a subject
    Create {
        #[command(flatten)]
        fields: SubjectFields,

        /// Create from JSON file (overrides individual flags)
        #[arg(long, short = 'F', conflicts_with_all = &["name", "code"])]
        from_file: Option<PathBuf>,
    },

    /// Update a subject
    Update {
        /// Subject ID
        id: String,

        #[command(flatten)]
        fields: SubjectFields,

        /// Load the update payload from a JSON file
        #[arg(long, short = 'F')]
        from_file: Option<PathBuf>,
    },

    /// Delete a subject
    #[command(alias = "rm")]
    Delete {
        /// Subject ID
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct SubjectFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub code: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub department: Option<String>,
}

// ── Sections ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SectionsArgs {
    #[command(subcommand)]
    pub command: SectionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SectionsCommand {
    /// List sections
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Filter by grade level
        #[arg(long)]
        grade_level: Option<String>,
    },

    /// Show one section with its assignments and enrollments
    Get {
        /// Section ID
        id: String,
    },

    /// Create a section
    Create {
        #[command(flatten)]
        fields: SectionFields,

        /// Create from JSON file (overrides individual flags)
        #[arg(
            long,
            short = 'F',
            conflicts_with_all = &["name", "grade_level", "school_year"]
        )]
        from_file: Option<PathBuf>,
    },

    /// Update a section
    Update {
        /// Section ID
        id: String,

        #[command(flatten)]
        fields: SectionFields,

        /// Load the update payload from a JSON file
        #[arg(long, short = 'F')]
        from_file: Option<PathBuf>,
    },

    /// Delete a section
    #[command(alias = "rm")]
    Delete {
        /// Section ID
        id: String,
    },

    /// Replace the section's subject assignments
    AssignSubjects {
        /// Section ID
        id: String,

        /// Assignment as SUBJECT_ID:TEACHER_ID[:SCHEDULE[:ROOM]] (repeatable)
        #[arg(long = "assign", required_unless_present = "from_file")]
        assignments: Vec<String>,

        /// Load the assignment list from a JSON file
        #[arg(long, short = 'F', conflicts_with = "assignments")]
        from_file: Option<PathBuf>,
    },

    /// Replace the section's enrolled students
    Enroll {
        /// Section ID
        id: String,

        /// Student IDs (repeat or comma-separate); empty clears the roster
        #[arg(long = "student", value_delimiter = ',')]
        students: Vec<String>,
    },
}

#[derive(Debug, Args)]
pub struct SectionFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub grade_level: Option<String>,
    #[arg(long)]
    pub school_year: Option<String>,
    /// Teacher ID of the section adviser
    #[arg(long)]
    pub adviser: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or extend the config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
