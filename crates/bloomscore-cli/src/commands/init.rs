//! The `bloomscore init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("bloomscore.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("samples")?;
    write_if_missing(Path::new("samples/sequence.json"), SAMPLE_SEQUENCE)?;
    write_if_missing(Path::new("samples/form.json"), SAMPLE_FORM)?;
    write_if_missing(Path::new("samples/questions.csv"), SAMPLE_QUESTIONS)?;

    println!("\nNext steps:");
    println!("  1. Describe your course in samples/sequence.json and samples/form.json");
    println!("  2. Run: bloomscore validate --sequence samples/sequence.json");
    println!(
        "  3. Run: bloomscore evaluate --sequence samples/sequence.json \
         --form samples/form.json --questions samples/questions.csv"
    );

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# bloomscore configuration

parallelism = 4
output_dir = "./bloomscore-results"

[recommendations]
# Flag a CO or module when its share of marks is this many points off.
co_threshold = 5.0
module_threshold = 5.0

[score]
alignment_weight = 0.6
balance_weight = 0.4

[lexicon]
# Extra verbs, merged over the built-in lexicon.
verbs = { sketch = "create", contrast = "analyze" }
"#;

const SAMPLE_SEQUENCE: &str = r#"[
  { "name": "CO1", "type": "CO", "weight": 25, "blooms": ["remember", "understand"] },
  { "name": "CO2", "type": "CO", "weight": 35, "blooms": "apply" },
  { "name": "CO3", "type": "CO", "weight": 25, "blooms": ["analyze"] },
  { "name": "CO4", "type": "CO", "weight": 15, "blooms": ["create"] },
  { "name": "Module 1", "type": "Module", "hours": 10 },
  { "name": "Module 2", "type": "Module", "hours": 12 },
  { "name": "Module 3", "type": "Module", "hours": 8 }
]
"#;

const SAMPLE_FORM: &str = r#"{
  "institution": "Example Institute of Technology",
  "branch": "Computer Engineering",
  "year": "2024-25",
  "semester": "V",
  "courseName": "Operating Systems",
  "courseCode": "CS501",
  "instructor": "A. Rao"
}
"#;

const SAMPLE_QUESTIONS: &str = "\
Question,Marks,CO,Module,QT,Difficulty
Define a deadlock and list its four necessary conditions,4,CO1,M1,Short,Easy
Explain how paging differs from segmentation,6,CO1,M1,Short,Medium
Calculate the average waiting time for the given process schedule under round robin,10,CO2,M2,Long,Medium
Solve the banker's algorithm instance for the given allocation matrix,8,CO2,M2,Long,Hard
Compare FCFS and SJF scheduling for the given workload,8,CO3,M2,Long,Medium
Describe the structure of a page table entry,6,CO3,M3,Short,Easy
Design a memory allocator for a real-time embedded system,10,CO4,M3,Long,Hard
The life cycle of a thread,4,CO1,M1,Short,Easy
";
