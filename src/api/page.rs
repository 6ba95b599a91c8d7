//! Self-contained upload page served at `/`.
//!
//! The page posts the chosen photo to `/api/verify` and renders the returned
//! outcome. Model-supplied text is inserted with `textContent` only.

use axum::response::Html;

/// `GET /`
pub async fn serve_upload_page() -> Html<&'static str> {
    Html(UPLOAD_PAGE_HTML)
}

pub const UPLOAD_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>FlashVerify: ID Verification</title>
  <style>
    * { box-sizing: border-box; margin: 0; padding: 0; }
    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', system-ui, sans-serif;
      background: #fafaf9; color: #1c1917; padding: 32px 24px;
    }
    main { max-width: 960px; margin: 0 auto; }
    h1 { font-size: 28px; margin-bottom: 8px; }
    p.lead { color: #78716c; font-size: 14px; margin-bottom: 24px; }
    .columns { display: flex; gap: 24px; flex-wrap: wrap; }
    .column { flex: 1 1 360px; }
    .btn {
      display: inline-flex; align-items: center; justify-content: center;
      padding: 14px 20px; border-radius: 12px; font-size: 16px; font-weight: 500;
      cursor: pointer; border: none; background: #4a7c59; color: white;
    }
    .btn:disabled { opacity: 0.5; cursor: not-allowed; }
    #preview { display: none; max-width: 100%; border-radius: 12px; margin-top: 16px; }
    #file-input { display: none; }
    .banner { padding: 16px; border-radius: 12px; font-weight: 600; margin-bottom: 16px; }
    .banner.success { background: #dcfce7; color: #166534; }
    .banner.error { background: #fee2e2; color: #991b1b; }
    .banner.warning { background: #fef9c3; color: #854d0e; }
    .note { color: #991b1b; font-size: 14px; margin-bottom: 16px; }
    .spinner { display: none; color: #78716c; margin-bottom: 16px; }
    dl { display: grid; grid-template-columns: max-content 1fr; gap: 8px 16px; margin-bottom: 16px; }
    dt { color: #78716c; }
    dd { font-weight: 500; word-break: break-all; }
    details { margin-top: 8px; }
    pre { background: #f5f5f4; padding: 12px; border-radius: 8px; overflow-x: auto; font-size: 12px; }
  </style>
</head>
<body>
<main>
  <h1>FlashVerify</h1>
  <p class="lead">Upload a photo of an Aadhaar or PAN card. The fields are extracted and checked against the ID format rules.</p>

  <div class="columns">
    <section class="column">
      <button class="btn" id="btn-choose">Upload ID Card</button>
      <input type="file" id="file-input" accept=".jpg,.jpeg,.png,image/jpeg,image/png">
      <img id="preview" alt="Uploaded document">
    </section>

    <section class="column">
      <div class="spinner" id="spinner">Reading card...</div>
      <div class="banner" id="banner" hidden></div>
      <div class="note" id="format-note" hidden></div>
      <dl id="fields" hidden>
        <dt>Name</dt><dd id="f-name"></dd>
        <dt>ID Number</dt><dd id="f-id"></dd>
        <dt>Document Type</dt><dd id="f-type"></dd>
        <dt>Language</dt><dd id="f-lang"></dd>
        <dt>Tamper Risk</dt><dd id="f-tamper"></dd>
      </dl>
      <details id="audit" hidden>
        <summary>Technical Audit Logs</summary>
        <pre id="audit-json"></pre>
      </details>
    </section>
  </div>
</main>

<script>
  var btnChoose = document.getElementById('btn-choose');
  var fileInput = document.getElementById('file-input');
  var preview = document.getElementById('preview');
  var spinner = document.getElementById('spinner');
  var banner = document.getElementById('banner');
  var formatNote = document.getElementById('format-note');
  var fields = document.getElementById('fields');
  var audit = document.getElementById('audit');
  var auditJson = document.getElementById('audit-json');

  btnChoose.addEventListener('click', function() { fileInput.click(); });
  fileInput.addEventListener('change', handleFile);

  function handleFile(e) {
    var file = e.target.files[0];
    if (!file) return;

    preview.src = URL.createObjectURL(file);
    preview.style.display = 'block';
    resetResult();

    var formData = new FormData();
    formData.append('file', file);

    spinner.style.display = 'block';
    btnChoose.disabled = true;

    var xhr = new XMLHttpRequest();
    xhr.open('POST', '/api/verify');
    xhr.onload = function() {
      spinner.style.display = 'none';
      btnChoose.disabled = false;
      fileInput.value = '';
      var resp;
      try {
        resp = JSON.parse(xhr.responseText);
      } catch (_) {
        showBanner('Verification failed', 'error');
        return;
      }
      render(resp);
    };
    xhr.onerror = function() {
      spinner.style.display = 'none';
      btnChoose.disabled = false;
      showBanner('Connection lost. Please try again.', 'error');
    };
    xhr.send(formData);
  }

  function resetResult() {
    banner.hidden = true;
    formatNote.hidden = true;
    fields.hidden = true;
    audit.hidden = true;
  }

  function showBanner(text, kind) {
    banner.textContent = text;
    banner.className = 'banner ' + kind;
    banner.hidden = false;
  }

  function render(resp) {
    if (resp.error) {
      showBanner(resp.error.message, 'error');
      return;
    }
    if (resp.status === 'unstructured') {
      showBanner(resp.message, 'warning');
      return;
    }
    if (resp.status === 'system_error') {
      showBanner(resp.message, 'error');
      return;
    }

    var v = resp.verdict;
    if (v.accepted) {
      showBanner('✅ DOCUMENT VERIFIED', 'success');
    } else {
      showBanner('🚨 ALERT: ' + v.reason, 'error');
    }

    v.rejections.forEach(function(r) {
      if (r.kind === 'format_invalid') {
        formatNote.textContent = r.note;
        formatNote.hidden = false;
      }
    });

    document.getElementById('f-name').textContent = v.name;
    document.getElementById('f-id').textContent = v.id_number;
    document.getElementById('f-type').textContent = v.doc_type;
    document.getElementById('f-lang').textContent = v.language;
    document.getElementById('f-tamper').textContent = v.tamper_risk;
    fields.hidden = false;

    auditJson.textContent = JSON.stringify(resp.raw_record, null, 2);
    audit.hidden = false;
  }
</script>
</body>
</html>
"#;
