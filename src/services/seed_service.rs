// Données de démo insérées au démarrage (SEED_DEMO_DATA=true) si aucun étudiant n'existe
use sea_orm::DatabaseConnection;

use crate::error::AppError;
use crate::models::dto::{AcademicDetailsInput, CreateStudentRequest};
use crate::services::student_service::StudentService;

const NAMED: [(&str, &str, &str, &str, &str, &str, i32, f64, i32); 5] = [
    ("Rahul Sharma", "rahul.sharma@email.com", "+91-9876543210", "Male", "Indian Institute of Technology Delhi", "Computer Science", 2024, 8.5, 0),
    ("Priya Patel", "priya.patel@email.com", "+91-9876543211", "Female", "Delhi University", "Information Technology", 2025, 9.1, 0),
    ("Amit Kumar", "amit.kumar@email.com", "+91-9876543212", "Male", "Jawaharlal Nehru University", "Electronics", 2024, 7.8, 1),
    ("Sneha Gupta", "sneha.gupta@email.com", "+91-9876543213", "Female", "Indian Institute of Technology Mumbai", "Mechanical Engineering", 2025, 8.9, 0),
    ("Vikram Singh", "vikram.singh@email.com", "+91-9876543214", "Male", "Bangalore University", "Computer Science", 2024, 8.2, 0),
];

const COLLEGES: [&str; 5] = ["BITS Pilani", "VIT University", "SRM University", "Manipal University", "Anna University"];
const DEPARTMENTS: [&str; 5] = ["Computer Science", "Information Technology", "Electronics", "Mechanical Engineering", "Civil Engineering"];
const FIRST_NAMES: [&str; 10] = ["Rajesh", "Kavya", "Arjun", "Deepika", "Manoj", "Pooja", "Sanjay", "Ritu", "Ashish", "Meera"];
const LAST_NAMES: [&str; 5] = ["Sharma", "Patel", "Kumar", "Singh", "Gupta"];
const GENERATED: usize = 20;

pub struct SeedService;

impl SeedService {
    /// Retourne le nombre d'étudiants insérés (0 si la table n'était pas vide).
    pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<usize, AppError> {
        if StudentService::count(db).await? > 0 {
            tracing::debug!("students table not empty, skipping demo data");
            return Ok(0);
        }

        let students = demo_students();
        let total = students.len();
        for student in students {
            StudentService::create(db, None, student).await?;
        }

        tracing::info!(students = total, "demo data created");
        Ok(total)
    }
}

fn demo_students() -> Vec<CreateStudentRequest> {
    let named = NAMED.iter().map(
        |&(name, email, phone, gender, college, department, year, cgpa, backlogs)| CreateStudentRequest {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            gender: gender.to_string(),
            academic_details: AcademicDetailsInput {
                college_name: college.to_string(),
                department: department.to_string(),
                graduation_year: year,
                cgpa,
                backlogs,
            },
        },
    );

    let generated = (0..GENERATED).map(|i| CreateStudentRequest {
        name: format!("{} {}", FIRST_NAMES[i % FIRST_NAMES.len()], LAST_NAMES[i % LAST_NAMES.len()]),
        email: format!("student{}@email.com", i + 6),
        phone: format!("+91-987654{}", 3215 + i),
        gender: (if i % 2 == 0 { "Male" } else { "Female" }).to_string(),
        academic_details: AcademicDetailsInput {
            college_name: COLLEGES[i % COLLEGES.len()].to_string(),
            department: DEPARTMENTS[i % DEPARTMENTS.len()].to_string(),
            graduation_year: 2024 + (i % 3) as i32,
            cgpa: ((7.0 + (i % 20) as f64 * 0.15) * 10.0).round() / 10.0,
            backlogs: (i % 3) as i32,
        },
    });

    named.chain(generated).collect()
}
