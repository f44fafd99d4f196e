use crate::models::{AnalysisResult, Confidence, NewReport};

const BLOOD_CANCER_EVIDENCE: &str = "The report explicitly labels the diagnostic report as \"Hematological Malignancy (Blood Cancer)\" and describes the patient presenting with advanced symptoms highly suggestive of a malignant hematological disorder, along with a comprehensive work‑up (CBC, peripheral smear, bone marrow biopsy, flow cytometry, cytogenetics, and imaging) performed to confirm blood cancer.";

const BLOOD_CANCER_TEXT: &str = "Confidential Medical Report CityGeneral Hospital DiagnosticReport: Hematological Malignancy (Blood Cancer) CityGeneral Hospital 1234Health Street, Medical City, MC 56789 Date: September 16, 2025 PatientInformation Name: John Doe Age: 45 PatientID: 987654 Date of Birth: January 15, 1980 Referring Physician: Dr. Emily Carter, MD ClinicalPresentation The patient presented with advanced symptoms highly suggestive of a malignant hematological disorder, including: • Severe persistent fatigue and profound weakness • Significant unexplained weight loss (15 kg over 2 months) • Frequent recurrent infections and fever • Extensive easy bruising, petechiae, and bleeding tendencies • Enlarged lymph nodes and splenomegaly indicative of possible metastatic spread DiagnosticTestsPerformed The following comprehensive tests were conducted on September 10, 2025, to confirm the presence of blood cancer: • Complete Blood Count (CBC) • Peripheral Blood Smear • Bone Marrow Biopsy and Aspiration • Flow Cytometry • Cytogenetic and Molecular Analysis • Imaging (CT/MRI) for Metastasis Assessment 1 of ??";

const SCREENING_EVIDENCE: &str = "The report indicates normal findings with no evidence of malignancy.";

const SCREENING_TEXT: &str = "Confidential Medical Report CityGeneral Hospital Routine Health Screening Report CityGeneral Hospital 1234Health Street, Medical City, MC 56789 Date: September 14, 2025 PatientInformation Name: Jane Smith Age: 42 PatientID: 876543 Date of Birth: March 22, 1983 Primary Care Physician: Dr. Robert Johnson, MD ExaminationFindings Physical examination: Normal vital signs, no abnormal findings in all major organ systems. Laboratory tests: CBC, metabolic panel, and other routine bloodwork within normal ranges. Radiological studies: Chest X-ray clear, no suspicious masses or abnormalities identified. Conclusion: No evidence of malignancy or other significant health concerns at this time. Recommendations: Continue routine health screenings as scheduled. Follow up in one year for next annual examination.";

/// 演示模式预置的示例报告：血液肿瘤诊断报告（阳性）与常规体检报告（阴性）
///
/// 时间为固定值，便于前端截图与测试对比。
pub fn sample_reports(user_id: &str) -> Vec<NewReport> {
    let confidence = |v: f64| Confidence::from_value(v).unwrap_or(Confidence::ZERO);

    vec![
        NewReport {
            session_id: "1726480000000".to_string(),
            user_id: user_id.to_string(),
            analysis_results: AnalysisResult::CancerPositive,
            confidence: confidence(92.0),
            evidence: BLOOD_CANCER_EVIDENCE.to_string(),
            extracted_text: BLOOD_CANCER_TEXT.to_string(),
            created_at: "2025-09-16T10:30:00.000Z".to_string(),
        },
        NewReport {
            session_id: "1726566400000".to_string(),
            user_id: user_id.to_string(),
            analysis_results: AnalysisResult::CancerNegative,
            confidence: confidence(89.0),
            evidence: SCREENING_EVIDENCE.to_string(),
            extracted_text: SCREENING_TEXT.to_string(),
            created_at: "2025-09-17T10:30:00.000Z".to_string(),
        },
    ]
}
