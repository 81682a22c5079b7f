// ============================================================================
// MODELS - MAIN MODULE
// ============================================================================
//
// Description:
//   Point d'entrée de tous les modèles de données.
//   Chaque entité correspond à une table via SeaORM ; dto contient les
//   formats JSON de l'API HTTP.
//
// Modules:
//   - users : comptes autorisés à modifier les données (email + hash)
//   - students : profil étudiant
//   - academic_details : college / department / year / CGPA (1:1 étudiant)
//   - documents : métadonnées des fichiers uploadés (1:n étudiant)
//   - health : réponse du health check
//   - dto : corps des requêtes / réponses
//
// Points d'attention:
//   - Les tables sont créées au démarrage à partir de ces entités (db::create_schema)
//   - Les relations sont déclarées des deux côtés pour les jointures
//
// ============================================================================

pub mod users;
pub mod students;
pub mod academic_details;
pub mod documents;
pub mod health;
pub mod dto;
